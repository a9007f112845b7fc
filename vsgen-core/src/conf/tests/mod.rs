mod discover_tests;
