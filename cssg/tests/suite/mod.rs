mod api;
mod smart_punct;
