//! Prompt sent to the idea generator.

/// Number of feature ideas requested from the model.
pub const FEATURE_IDEA_COUNT: usize = 3;

/// Builds the feature-idea prompt for a project goal.
#[must_use]
pub fn build_prompt(goal: &str, current_spec: Option<&str>) -> String {
    let spec = current_spec
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(none)");

    format!(
        "Given the project goal: {goal}\n\
         And current specification: {spec}\n\
         \n\
         Generate {FEATURE_IDEA_COUNT} unique, high-value feature ideas that would enhance this project.\n\
         Respond with JSON only, in this format:\n\
         {{\"feature_ideas\": [{{\"name\": \"Feature Name\", \"description\": \"Detailed description\", \"value_prop\": \"Why this matters\"}}]}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_goal_and_spec() {
        let prompt = build_prompt("Build a simple todo list app", Some("v1 has lists"));
        assert!(prompt.contains("Build a simple todo list app"));
        assert!(prompt.contains("v1 has lists"));
        assert!(prompt.contains("\"feature_ideas\""));
    }

    #[test]
    fn test_prompt_without_spec() {
        assert!(build_prompt("goal", None).contains("current specification: (none)"));
        assert!(build_prompt("goal", Some("  ")).contains("current specification: (none)"));
    }
}
