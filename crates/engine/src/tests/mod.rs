mod helpers;
mod scenario_tests;
