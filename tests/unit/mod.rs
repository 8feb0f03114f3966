/// Unit test suite for the public library API
mod basic_tests;
mod lifecycle_tests;
