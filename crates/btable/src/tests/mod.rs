mod numeric_tests;
mod writer_tests;
