mod async_index_test;
mod index_negative_test;
mod index_test;
mod text_index_test;
