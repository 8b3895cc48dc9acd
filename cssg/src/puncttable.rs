// Copyright 2015 Google Inc. All rights reserved.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Unicode punctuation classification used by emphasis flanking rules.
//!
//! A character counts as punctuation when its general category is in the
//! `P` (punctuation) or `S` (symbol) groups. The tables group code points in
//! blocks of sixteen: `PUNCT_TAB` lists the blocks that hold at least one
//! punctuation character and `PUNCT_MASKS` the matching sixteen-bit masks.

#[rustfmt::skip]
const PUNCT_MASKS_ASCII: [u16; 8] = [
    0x0000, 0x0000, 0xfffe, 0xfc00, 0x0001, 0xf800, 0x0001, 0x7800,
];

pub(crate) fn is_ascii_punctuation(c: u8) -> bool {
    c < 128 && (PUNCT_MASKS_ASCII[(c / 16) as usize] & (1 << (c & 15))) != 0
}

pub(crate) fn is_punctuation(c: char) -> bool {
    let cp = c as u32;
    if cp < 128 {
        return is_ascii_punctuation(cp as u8);
    }
    if cp > 0x1FBCF {
        return false;
    }
    let high = (cp / 16) as u16;
    match PUNCT_TAB.binary_search(&high) {
        Ok(index) => (PUNCT_MASKS[index] & (1 << (cp & 15))) != 0,
        _ => false,
    }
}

#[rustfmt::skip]
static PUNCT_TAB: [u16; 725] = [
    0x000a, 0x000b, 0x000d, 0x000f, 0x002c, 0x002d, 0x002e, 0x002f,
    0x0037, 0x0038, 0x003f, 0x0048, 0x0055, 0x0058, 0x005b, 0x005c,
    0x005f, 0x0060, 0x0061, 0x0066, 0x006d, 0x006e, 0x006f, 0x0070,
    0x007f, 0x0083, 0x0085, 0x0088, 0x0096, 0x0097, 0x009f, 0x00a7,
    0x00af, 0x00b7, 0x00bf, 0x00c7, 0x00c8, 0x00d4, 0x00d7, 0x00df,
    0x00e3, 0x00e4, 0x00e5, 0x00f0, 0x00f1, 0x00f3, 0x00f8, 0x00fb,
    0x00fc, 0x00fd, 0x0104, 0x0109, 0x010f, 0x0136, 0x0139, 0x0140,
    0x0166, 0x0169, 0x016e, 0x0173, 0x017d, 0x0180, 0x0194, 0x019d,
    0x019e, 0x019f, 0x01a1, 0x01aa, 0x01b5, 0x01b6, 0x01b7, 0x01bf,
    0x01c3, 0x01c7, 0x01cc, 0x01cd, 0x01fb, 0x01fc, 0x01fd, 0x01fe,
    0x01ff, 0x0201, 0x0202, 0x0203, 0x0204, 0x0205, 0x0207, 0x0208,
    0x020a, 0x020b, 0x020c, 0x0210, 0x0211, 0x0212, 0x0213, 0x0214,
    0x0218, 0x0219, 0x021a, 0x021b, 0x021c, 0x021d, 0x021e, 0x021f,
    0x0220, 0x0221, 0x0222, 0x0223, 0x0224, 0x0225, 0x0226, 0x0227,
    0x0228, 0x0229, 0x022a, 0x022b, 0x022c, 0x022d, 0x022e, 0x022f,
    0x0230, 0x0231, 0x0232, 0x0233, 0x0234, 0x0235, 0x0236, 0x0237,
    0x0238, 0x0239, 0x023a, 0x023b, 0x023c, 0x023d, 0x023e, 0x023f,
    0x0240, 0x0241, 0x0242, 0x0244, 0x0249, 0x024a, 0x024b, 0x024c,
    0x024d, 0x024e, 0x0250, 0x0251, 0x0252, 0x0253, 0x0254, 0x0255,
    0x0256, 0x0257, 0x0258, 0x0259, 0x025a, 0x025b, 0x025c, 0x025d,
    0x025e, 0x025f, 0x0260, 0x0261, 0x0262, 0x0263, 0x0264, 0x0265,
    0x0266, 0x0267, 0x0268, 0x0269, 0x026a, 0x026b, 0x026c, 0x026d,
    0x026e, 0x026f, 0x0270, 0x0271, 0x0272, 0x0273, 0x0274, 0x0275,
    0x0276, 0x0277, 0x0279, 0x027a, 0x027b, 0x027c, 0x027d, 0x027e,
    0x027f, 0x0280, 0x0281, 0x0282, 0x0283, 0x0284, 0x0285, 0x0286,
    0x0287, 0x0288, 0x0289, 0x028a, 0x028b, 0x028c, 0x028d, 0x028e,
    0x028f, 0x0290, 0x0291, 0x0292, 0x0293, 0x0294, 0x0295, 0x0296,
    0x0297, 0x0298, 0x0299, 0x029a, 0x029b, 0x029c, 0x029d, 0x029e,
    0x029f, 0x02a0, 0x02a1, 0x02a2, 0x02a3, 0x02a4, 0x02a5, 0x02a6,
    0x02a7, 0x02a8, 0x02a9, 0x02aa, 0x02ab, 0x02ac, 0x02ad, 0x02ae,
    0x02af, 0x02b0, 0x02b1, 0x02b2, 0x02b3, 0x02b4, 0x02b5, 0x02b6,
    0x02b7, 0x02b8, 0x02b9, 0x02ba, 0x02bb, 0x02bc, 0x02bd, 0x02be,
    0x02bf, 0x02ce, 0x02cf, 0x02d7, 0x02e0, 0x02e1, 0x02e2, 0x02e3,
    0x02e4, 0x02e5, 0x02e8, 0x02e9, 0x02ea, 0x02eb, 0x02ec, 0x02ed,
    0x02ee, 0x02ef, 0x02f0, 0x02f1, 0x02f2, 0x02f3, 0x02f4, 0x02f5,
    0x02f6, 0x02f7, 0x02f8, 0x02f9, 0x02fa, 0x02fb, 0x02fc, 0x02fd,
    0x02ff, 0x0300, 0x0301, 0x0302, 0x0303, 0x0309, 0x030a, 0x030f,
    0x0319, 0x031c, 0x031d, 0x031e, 0x0320, 0x0321, 0x0322, 0x0323,
    0x0324, 0x0325, 0x0326, 0x0327, 0x0328, 0x0329, 0x032a, 0x032b,
    0x032c, 0x032d, 0x032e, 0x032f, 0x0330, 0x0331, 0x0332, 0x0333,
    0x0334, 0x0335, 0x0336, 0x0337, 0x0338, 0x0339, 0x033a, 0x033b,
    0x033c, 0x033d, 0x033e, 0x033f, 0x04dc, 0x04dd, 0x04de, 0x04df,
    0x0a49, 0x0a4a, 0x0a4b, 0x0a4c, 0x0a4f, 0x0a60, 0x0a67, 0x0a6f,
    0x0a70, 0x0a71, 0x0a72, 0x0a78, 0x0a82, 0x0a83, 0x0a87, 0x0a8c,
    0x0a8f, 0x0a92, 0x0a95, 0x0a9c, 0x0a9d, 0x0aa5, 0x0aa7, 0x0aad,
    0x0aaf, 0x0ab5, 0x0ab6, 0x0abe, 0x0fb2, 0x0fbb, 0x0fbc, 0x0fd3,
    0x0fd4, 0x0fdc, 0x0fdf, 0x0fe1, 0x0fe3, 0x0fe4, 0x0fe5, 0x0fe6,
    0x0ff0, 0x0ff1, 0x0ff2, 0x0ff3, 0x0ff4, 0x0ff5, 0x0ff6, 0x0ffe,
    0x0fff, 0x1010, 0x1013, 0x1017, 0x1018, 0x1019, 0x101a, 0x101d,
    0x101e, 0x101f, 0x1039, 0x103d, 0x1056, 0x1085, 0x1087, 0x1091,
    0x1093, 0x10a5, 0x10a7, 0x10ac, 0x10af, 0x10b3, 0x10b9, 0x10ea,
    0x10f5, 0x10f8, 0x1104, 0x110b, 0x110c, 0x1114, 0x1117, 0x111c,
    0x111d, 0x1123, 0x112a, 0x1144, 0x1145, 0x114c, 0x115c, 0x115d,
    0x1164, 0x1166, 0x116b, 0x1173, 0x1183, 0x1194, 0x119e, 0x11a3,
    0x11a4, 0x11a9, 0x11aa, 0x11c4, 0x11c7, 0x11ef, 0x11fd, 0x11fe,
    0x11ff, 0x1247, 0x12ff, 0x16a6, 0x16af, 0x16b3, 0x16b4, 0x16e9,
    0x16fe, 0x1bc9, 0x1cf5, 0x1cf6, 0x1cf7, 0x1cf8, 0x1cf9, 0x1cfa,
    0x1cfb, 0x1cfc, 0x1d00, 0x1d01, 0x1d02, 0x1d03, 0x1d04, 0x1d05,
    0x1d06, 0x1d07, 0x1d08, 0x1d09, 0x1d0a, 0x1d0b, 0x1d0c, 0x1d0d,
    0x1d0e, 0x1d0f, 0x1d10, 0x1d11, 0x1d12, 0x1d13, 0x1d14, 0x1d15,
    0x1d16, 0x1d18, 0x1d19, 0x1d1a, 0x1d1b, 0x1d1c, 0x1d1d, 0x1d1e,
    0x1d20, 0x1d21, 0x1d22, 0x1d23, 0x1d24, 0x1d30, 0x1d31, 0x1d32,
    0x1d33, 0x1d34, 0x1d35, 0x1d6c, 0x1d6d, 0x1d6f, 0x1d71, 0x1d73,
    0x1d74, 0x1d76, 0x1d78, 0x1d7a, 0x1d7c, 0x1d80, 0x1d81, 0x1d82,
    0x1d83, 0x1d84, 0x1d85, 0x1d86, 0x1d87, 0x1d88, 0x1d89, 0x1d8a,
    0x1d8b, 0x1d8c, 0x1d8d, 0x1d8e, 0x1d8f, 0x1d90, 0x1d91, 0x1d92,
    0x1d93, 0x1d94, 0x1d95, 0x1d96, 0x1d97, 0x1d98, 0x1d99, 0x1d9a,
    0x1d9b, 0x1d9c, 0x1d9d, 0x1d9e, 0x1d9f, 0x1da3, 0x1da6, 0x1da7,
    0x1da8, 0x1e14, 0x1e2f, 0x1e95, 0x1eca, 0x1ecb, 0x1ed2, 0x1eef,
    0x1f00, 0x1f01, 0x1f02, 0x1f03, 0x1f04, 0x1f05, 0x1f06, 0x1f07,
    0x1f08, 0x1f09, 0x1f0a, 0x1f0b, 0x1f0c, 0x1f0d, 0x1f0e, 0x1f0f,
    0x1f10, 0x1f11, 0x1f12, 0x1f13, 0x1f14, 0x1f15, 0x1f16, 0x1f17,
    0x1f18, 0x1f19, 0x1f1a, 0x1f1e, 0x1f1f, 0x1f20, 0x1f21, 0x1f22,
    0x1f23, 0x1f24, 0x1f25, 0x1f26, 0x1f30, 0x1f31, 0x1f32, 0x1f33,
    0x1f34, 0x1f35, 0x1f36, 0x1f37, 0x1f38, 0x1f39, 0x1f3a, 0x1f3b,
    0x1f3c, 0x1f3d, 0x1f3e, 0x1f3f, 0x1f40, 0x1f41, 0x1f42, 0x1f43,
    0x1f44, 0x1f45, 0x1f46, 0x1f47, 0x1f48, 0x1f49, 0x1f4a, 0x1f4b,
    0x1f4c, 0x1f4d, 0x1f4e, 0x1f4f, 0x1f50, 0x1f51, 0x1f52, 0x1f53,
    0x1f54, 0x1f55, 0x1f56, 0x1f57, 0x1f58, 0x1f59, 0x1f5a, 0x1f5b,
    0x1f5c, 0x1f5d, 0x1f5e, 0x1f5f, 0x1f60, 0x1f61, 0x1f62, 0x1f63,
    0x1f64, 0x1f65, 0x1f66, 0x1f67, 0x1f68, 0x1f69, 0x1f6a, 0x1f6b,
    0x1f6c, 0x1f6d, 0x1f6e, 0x1f6f, 0x1f70, 0x1f71, 0x1f72, 0x1f73,
    0x1f74, 0x1f75, 0x1f76, 0x1f77, 0x1f78, 0x1f79, 0x1f7a, 0x1f7b,
    0x1f7c, 0x1f7d, 0x1f7e, 0x1f7f, 0x1f80, 0x1f81, 0x1f82, 0x1f83,
    0x1f84, 0x1f85, 0x1f86, 0x1f87, 0x1f88, 0x1f89, 0x1f8a, 0x1f8b,
    0x1f90, 0x1f91, 0x1f92, 0x1f93, 0x1f94, 0x1f95, 0x1f96, 0x1f97,
    0x1f98, 0x1f99, 0x1f9a, 0x1f9b, 0x1f9c, 0x1f9d, 0x1f9e, 0x1f9f,
    0x1fa0, 0x1fa1, 0x1fa2, 0x1fa3, 0x1fa4, 0x1fa5, 0x1fa6, 0x1fa7,
    0x1fa8, 0x1fa9, 0x1faa, 0x1fab, 0x1fac, 0x1fad, 0x1fae, 0x1faf,
    0x1fb0, 0x1fb1, 0x1fb2, 0x1fb3, 0x1fb4, 0x1fb5, 0x1fb6, 0x1fb7,
    0x1fb8, 0x1fb9, 0x1fba, 0x1fbb, 0x1fbc,
];

#[rustfmt::skip]
static PUNCT_MASKS: [u16; 725] = [
    0xdbfe, 0x89d3, 0x0080, 0x0080, 0x003c, 0xfffc, 0xafe0, 0xffff,
    0x4020, 0x00b0, 0x0040, 0x0004, 0xfc00, 0xe600, 0x4000, 0x0049,
    0x0018, 0xffc0, 0xe800, 0x3c00, 0x4010, 0x0200, 0x6000, 0x3fff,
    0xc3c0, 0x7fff, 0x4000, 0x0100, 0x0030, 0x0001, 0x2c0c, 0x0040,
    0x0003, 0x0001, 0x07f8, 0x8080, 0x0010, 0x8000, 0x0200, 0x0010,
    0x8000, 0x8000, 0x0c00, 0xfffe, 0xfcff, 0x3d50, 0x0020, 0xc000,
    0xdfbf, 0x07ff, 0xfc00, 0xc000, 0x0800, 0x01ff, 0x03ff, 0x0001,
    0x6000, 0x1800, 0x3800, 0x0060, 0x0f70, 0x07ff, 0x0031, 0xc000,
    0xffff, 0xffff, 0xc000, 0x3f7f, 0xfc00, 0x07ff, 0x7ff0, 0xf000,
    0xf800, 0xc000, 0x00ff, 0x0008, 0xa000, 0xe003, 0xe000, 0xe000,
    0x6000, 0xffff, 0x00ff, 0xffff, 0xffff, 0x7fff, 0x7c00, 0x7c00,
    0xffff, 0xffff, 0x0001, 0x037b, 0xc1d0, 0x42af, 0x0c00, 0xbc1f,
    0x0c00, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0x007f, 0x07ff, 0xf000, 0xffff, 0xffff, 0xffff,
    0xffff, 0x03ff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x003f, 0xfff0, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffcf, 0xffff, 0xffbf, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x07e0, 0xde00, 0x0001, 0xffff, 0xffff, 0x7fff, 0xffff,
    0xffff, 0x3fff, 0xffff, 0xfbff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x000f, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0x003f,
    0x0fff, 0xff1e, 0xffff, 0x0001, 0xe0c1, 0x1800, 0x0001, 0x0800,
    0xffc3, 0xffff, 0xffff, 0x000f, 0xffff, 0x7fff, 0xfc00, 0xffff,
    0x00ff, 0x0001, 0xffff, 0xffff, 0xfc00, 0xffff, 0xffff, 0x0001,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0x007f, 0xc000, 0xe000, 0x4008, 0x00fc,
    0xffff, 0x007f, 0x0003, 0x0600, 0x0f00, 0x03c0, 0x00f0, 0xc000,
    0x1700, 0xc000, 0x8000, 0x3ffe, 0xc000, 0xf000, 0x0380, 0xc000,
    0x0003, 0x0800, 0x0c00, 0x0800, 0x0200, 0xfffc, 0x0007, 0xc000,
    0xffff, 0x8000, 0xf000, 0x03ff, 0xffff, 0xffff, 0xfff7, 0x0f7f,
    0xfffe, 0xfc00, 0x0001, 0xf800, 0x0001, 0xf800, 0x003f, 0x7f7f,
    0x3000, 0x0007, 0xff80, 0xfe00, 0x73ff, 0x1fff, 0x0001, 0xffff,
    0xffff, 0x1fff, 0x8000, 0x0001, 0x8000, 0x0080, 0x0180, 0x8000,
    0x8000, 0x01ff, 0x8000, 0x0100, 0x007f, 0xfe00, 0x1e00, 0x2000,
    0x03e0, 0x03c0, 0x3f80, 0xd800, 0x0003, 0x000f, 0x0030, 0x21e0,
    0xe800, 0x3f00, 0x0200, 0xf800, 0x2c00, 0x0040, 0xfffe, 0x00ff,
    0x000e, 0x1fff, 0x0200, 0xf000, 0x0800, 0x0070, 0x0004, 0x8000,
    0x007f, 0xdc00, 0x0007, 0x003e, 0x0003, 0x0180, 0xffe0, 0xffff,
    0x8003, 0x001f, 0x0006, 0xc000, 0x0020, 0xff80, 0x0030, 0x0780,
    0x0004, 0x9000, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x000f, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x003f, 0xffff, 0xffff, 0xfe7f, 0xffff, 0xffff, 0xffff,
    0x1c1f, 0xf018, 0xffff, 0xc3ff, 0xffff, 0xffff, 0xffff, 0x07ff,
    0xffff, 0xffff, 0xffff, 0xffff, 0x0023, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0x007f, 0x0002, 0x0800, 0x0800, 0x0020, 0x0020,
    0x8000, 0x8000, 0x0200, 0x0200, 0x0008, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0x0780, 0xe000, 0xffdf,
    0x0fef, 0x8000, 0x8000, 0xc000, 0x1000, 0x0001, 0x4000, 0x0003,
    0xffff, 0xffff, 0x0fff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x000f, 0x7fff, 0xfffe, 0xfffe, 0xfffe, 0xffff, 0x003f,
    0xe000, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0x3fff, 0xffc0, 0xffff, 0x0007, 0xffff, 0xffff,
    0x0fff, 0x01ff, 0x0003, 0x003f, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xe0ff, 0x1fff, 0x1fff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0x000f, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0x01ff, 0x0fff, 0x0001, 0x0fff, 0xffff, 0xffff, 0xffff,
    0x00ff, 0x03ff, 0xffff, 0xffff, 0x00ff, 0xffff, 0x3fff, 0x0003,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0x000f, 0x3fff, 0x1f1f,
    0x007f, 0xffff, 0x1fff, 0x07ff, 0x003f, 0x03ff, 0x00ff, 0x007f,
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
    0xffff, 0xfff7, 0xffff, 0xffff, 0x07ff,
];
