mod path_resolver_tests;
mod resource_path_tests;
