use std::env;

/// Reads a variable from the environment or `.env`, or `None` (with a note) so the
/// calling test can skip itself.
pub fn get_env_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    dotenv::dotenv().ok();

    match env::var(var_name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            println!(
                "Skipping integration test {} - {} environment variable not set.",
                test_name, var_name
            );
            None
        }
    }
}
