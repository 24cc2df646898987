pub mod household_reader;
pub mod result_writer;
