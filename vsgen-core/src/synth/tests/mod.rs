mod scenario_tests;
mod upstream_tests;
