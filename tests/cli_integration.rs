use mundofi_core::config::is_evm_address;
use serde_json::Value;
use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("mundofi");
    Command::new(binary_path)
        .env_remove("MUNDOFI_PROVIDER")
        .env_remove("MUNDOFI_API_BASE")
        .env_remove("MUNDOFI_DEMO_MODE")
        .args(args)
        .output()
        .expect("cli run succeeds")
}

fn run_json(args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_cli(&full);

    assert!(
        output.status.success(),
        "cli exited unsuccessfully: {:?}",
        output
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
fn cli_transfer_with_preset() {
    let out = run_json(&[
        "transfer",
        "--goal-title",
        "Vacation",
        "--target",
        "200",
        "--amount",
        "50",
        "--wallet",
        "2",
        "--pin",
        "123456",
    ]);

    assert_eq!(out["status"], "completed");
    assert_eq!(out["result"]["receipt"]["amount"], 50.0);
    assert_eq!(out["result"]["receipt"]["walletId"], "2");
    assert_eq!(out["result"]["goal"]["title"], "Vacation");
    assert_eq!(out["result"]["goal"]["currentAmount"], 50.0);
    assert_eq!(out["result"]["goal"]["status"], "active");
    assert_eq!(out["result"]["activity"][0]["kind"], "deposit");
    assert_eq!(out["result"]["activity"][0]["title"], "Vacation");
}

#[test]
fn cli_transfer_with_custom_amount_completes_goal() {
    let out = run_json(&[
        "transfer",
        "--target",
        "1,000",
        "--custom",
        "1,200.75",
        "--pin",
        "000000",
    ]);

    assert_eq!(out["result"]["receipt"]["amount"], 1200.75);
    assert_eq!(out["result"]["receipt"]["walletId"], "1");
    assert_eq!(out["result"]["goal"]["status"], "completed");
    assert_eq!(out["result"]["activity"][1]["kind"], "goal_completed");
}

#[test]
fn cli_transfer_rejects_non_preset_amount() {
    let output = run_cli(&["transfer", "--amount", "42", "--pin", "123456"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not one of the preset amounts"), "{}", stderr);
}

#[test]
fn cli_transfer_rejects_short_pin() {
    let output = run_cli(&["transfer", "--pin", "123"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PIN must be 6 digits"), "{}", stderr);
}

#[test]
fn cli_create_wallet_hides_pin() {
    let output = run_cli(&[
        "--json",
        "create-wallet",
        "--email",
        "ana@example.com",
        "--otp",
        "123456",
        "--name",
        "Rainy day",
        "--pin",
        "482913",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let out: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(out["status"], "completed");
    assert_eq!(out["result"]["name"], "Rainy day");
    assert!(is_evm_address(out["result"]["address"].as_str().unwrap()));
    assert!(out["result"].get("pin").is_none());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("ana@example.com"));
}

#[test]
fn cli_create_wallet_rejects_wrong_code() {
    let output = run_cli(&[
        "create-wallet",
        "--email",
        "ana@example.com",
        "--otp",
        "000000",
        "--name",
        "Rainy day",
        "--pin",
        "482913",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid verification code"), "{}", stderr);
}

#[test]
fn cli_connect_wallet() {
    let out = run_json(&["connect-wallet", "--name", "MetaMask", "--pin", "246810"]);
    assert_eq!(out["result"]["name"], "MetaMask");
    assert_eq!(out["result"]["network"], "base-sepolia");
    assert!(is_evm_address(out["result"]["address"].as_str().unwrap()));
}

#[test]
fn cli_trust_and_format() {
    let trust = run_json(&["trust"]);
    assert_eq!(trust["score"], 742);
    assert_eq!(trust["maxScore"], 850);
    assert_eq!(trust["activities"].as_array().unwrap().len(), 5);

    let formatted = run_json(&["format", "9876543.21"]);
    assert_eq!(formatted["formatted"], "9,876,543.21");
}

#[test]
fn cli_activity_search_and_filter() {
    let out = run_json(&["activity", "--search", "FUND"]);
    let groups = out["groups"].as_array().unwrap();
    assert_eq!(groups[0]["title"], "Today");
    assert_eq!(groups[0]["activities"][0]["title"], "Emergency Fund");
    assert_eq!(groups[1]["title"], "Yesterday");
    assert_eq!(groups[1]["activities"][0]["title"], "Vacation Fund");

    let out = run_json(&["activity", "--filter", "swaps", "--filter", "completed"]);
    assert_eq!(out["filters"], serde_json::json!(["swaps", "completed"]));
    assert_eq!(out["groups"][0]["activities"][0]["kind"], "swap");

    let output = run_cli(&["activity", "--filter", "withdrawals"]);
    assert!(!output.status.success());
}
