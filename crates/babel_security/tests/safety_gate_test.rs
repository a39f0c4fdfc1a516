use babel_core::AgeGroup;
use babel_error::SafetyErrorKind;
use babel_security::{SafetyCategory, SafetyGate, SafetyPolicy};

#[test]
fn test_safe_prompts_pass() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    assert!(gate.is_safe("a curious fox"));
    assert!(gate.is_safe("A bunny who learns to share carrots"));
    // Substrings of banned words do not match.
    assert!(gate.is_safe("a white kitten on a hill"));
    assert!(gate.is_safe("Hello, shell collector!"));
    Ok(())
}

#[test]
fn test_banned_terms_are_rejected() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    assert!(!gate.is_safe("kids fighting with knives and a monster"));
    assert!(!gate.is_safe("A MONSTER under the bed"));
    assert!(!gate.is_safe("the ghost of the lighthouse"));
    assert!(!gate.is_safe("a princess who wants to marry"));
    Ok(())
}

#[test]
fn test_violations_report_categories() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    let violations = gate.violations("a stupid monster with a gun");
    let categories: Vec<_> = violations.iter().map(|v| v.category).collect();
    assert!(categories.contains(&SafetyCategory::Violence));
    assert!(categories.contains(&SafetyCategory::Scary));
    assert!(categories.contains(&SafetyCategory::Language));
    Ok(())
}

#[test]
fn test_check_prompt_names_term() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    let err = gate
        .check_prompt("a knife in the kitchen")
        .expect_err("should be unsafe");
    match err.kind {
        SafetyErrorKind::UnsafePrompt { matched } => assert_eq!(matched, "knife"),
        other => panic!("unexpected kind: {other}"),
    }
    assert!(gate.check_prompt("a curious fox").is_ok());
    Ok(())
}

#[test]
fn test_sanitize_text() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    assert_eq!(
        gate.sanitize_text("The Monster did not fight"),
        "The friendly creature did not play"
    );
    assert_eq!(gate.sanitize_text("a happy day"), "a happy day");
    Ok(())
}

#[test]
fn test_make_image_prompt_safe() -> anyhow::Result<()> {
    let gate = SafetyGate::standard()?;
    let prompt = gate.make_image_prompt_safe("A fox in a meadow", AgeGroup::ZeroToSixMonths);
    assert_eq!(
        prompt,
        "A fox in a meadow. Style: simple shapes, high contrast, baby-safe. \
         Cartoon illustration, no scary elements, bright and cheerful."
    );
    assert!(gate.is_image_prompt_safe(&prompt));
    Ok(())
}

#[test]
fn test_custom_policy() -> anyhow::Result<()> {
    let mut policy = SafetyPolicy::default();
    policy
        .banned
        .entry(SafetyCategory::Scary)
        .or_default()
        .push("spider".to_string());
    let gate = SafetyGate::new(&policy)?;
    assert!(!gate.is_safe("a spider spinning"));
    Ok(())
}
