mod find_test;
mod projection_test;
mod write_test;
