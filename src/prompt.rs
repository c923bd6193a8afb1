use std::io::{self, BufRead, Write};

/// Interpret an answer to the season prompt. Anything that isn't a year
/// falls back to `default_year`.
pub fn parse_year_input(input: &str, default_year: i32) -> (i32, bool) {
    match input.trim().parse::<i32>() {
        Ok(year) => (year, true),
        Err(_) => (default_year, false),
    }
}

/// Prompts the user for a season year on stdin
///
/// Non-numeric input (or a closed stdin) uses `default_year` instead of
/// failing; out-of-range years are left for the standings computation to
/// reject.
pub fn prompt_for_year(default_year: i32) -> i32 {
    print!("Enter F1 season year (e.g., 2021, 2022, 2023, 2024): ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line);

    let (year, valid) = match read {
        Ok(_) => parse_year_input(&line, default_year),
        Err(_) => (default_year, false),
    };

    if !valid {
        println!("Invalid input. Using default year {}.", default_year);
    }

    year
}
