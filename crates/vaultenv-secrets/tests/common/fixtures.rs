//! Deployment config fixtures

use vaultenv_core::DeployConfig;

/// Build a serverless-style config pointing at `vault_url`
pub fn deploy_config(
    vault_url: &str,
    paths: &[&str],
    declared: &[&str],
    kms_key: Option<&str>,
) -> DeployConfig {
    let mut yaml = String::from("service: orders\nprovider:\n  name: aws\n  environment:\n");
    for key in declared {
        yaml.push_str(&format!("    {}: \"\"\n", key));
    }
    yaml.push_str("custom:\n  vault:\n");
    yaml.push_str(&format!("    url: {}\n", vault_url));
    yaml.push_str(&format!("    token: {}\n", super::TEST_TOKEN));
    yaml.push_str("    paths:\n");
    for p in paths {
        yaml.push_str(&format!("      - {}\n", p));
    }
    if let Some(key) = kms_key {
        yaml.push_str(&format!("  kms:\n    keyId: {}\n", key));
    }
    yaml.push_str("functions:\n  api:\n    handler: handler.main\n");

    DeployConfig::from_yaml_str(&yaml).expect("fixture config should parse")
}
