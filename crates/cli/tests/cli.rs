use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("classifieds-cli").unwrap();
    cmd.env("CLASSIFIEDS_ENV", "local")
        .env("CLASSIFIEDS_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn help_lists_commands() {
    let output = cli().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "migrate", "token"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn token_prints_a_jwt() {
    let output = cli()
        .args([
            "token",
            "--user-id",
            "5f0c6a2e-8c1b-4d7e-9a43-2b1f6f0a9c11",
            "--name",
            "Ana",
            "--admin",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let token = String::from_utf8(output.stdout).unwrap();
    assert_eq!(token.trim().split('.').count(), 3);
}

#[test]
fn token_requires_a_valid_user_id() {
    cli()
        .args(["token", "--user-id", "nope", "--name", "Ana"])
        .assert()
        .failure();
}
