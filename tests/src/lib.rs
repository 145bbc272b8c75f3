//! Scenario tests that drive the client against a local HTTP double.

#[cfg(test)]
mod scenarios;
