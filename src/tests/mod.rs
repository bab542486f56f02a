pub mod mocks;

mod scheduler_tests;
