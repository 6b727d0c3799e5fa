mod helpers;
mod table_tests;
