//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// An envkey command running as `user` in the test project dir.
    pub fn cmd_as(&self, user: &str) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("envkey").expect("failed to find envkey binary");
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path().join(".config"));
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("ENVKEY_IDENTITY", self.identity_path(user));
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("ENVKEY_FILE");
        cmd.env_remove("ENVKEY_ENV");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// An envkey command running as the default admin ("alice").
    pub fn cmd(&self) -> Command {
        self.cmd_as("alice")
    }

    /// `envkey init --name <name>` as that user (creates their identity).
    pub fn init_cmd(&self, name: &str) -> Output {
        self.cmd_as(name)
            .args(["init", "--name", name])
            .output()
            .expect("failed to run envkey init")
    }

    pub fn set(&self, key: &str, val: &str) -> Output {
        self.cmd()
            .args(["set", key, val])
            .output()
            .expect("failed to run envkey set")
    }

    pub fn set_in(&self, env: &str, key: &str, val: &str) -> Output {
        self.cmd()
            .args(["set", "-e", env, key, val])
            .output()
            .expect("failed to run envkey set -e")
    }

    pub fn get(&self, key: &str) -> Output {
        self.cmd()
            .args(["get", key])
            .output()
            .expect("failed to run envkey get")
    }

    pub fn get_in(&self, env: &str, key: &str) -> Output {
        self.cmd()
            .args(["get", "-e", env, key])
            .output()
            .expect("failed to run envkey get -e")
    }

    pub fn get_as(&self, user: &str, env: &str, key: &str) -> Output {
        self.cmd_as(user)
            .args(["get", "-e", env, key])
            .output()
            .expect("failed to run envkey get")
    }

    pub fn ls(&self) -> Output {
        self.cmd().arg("ls").output().expect("failed to run envkey ls")
    }

    pub fn rm(&self, key: &str) -> Output {
        self.cmd()
            .args(["rm", key])
            .output()
            .expect("failed to run envkey rm")
    }

    pub fn member_add(&self, name: &str, key: &str) -> Output {
        self.cmd()
            .args(["member", "add", name, key])
            .output()
            .expect("failed to run envkey member add")
    }

    pub fn member_add_role(&self, name: &str, key: &str, role: &str, envs: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.args(["member", "add", name, key, "--role", role]);
        for env in envs {
            cmd.args(["-e", env]);
        }
        cmd.output().expect("failed to run envkey member add")
    }

    pub fn member_rm(&self, name: &str) -> Output {
        self.cmd()
            .args(["member", "rm", name, "--yes"])
            .output()
            .expect("failed to run envkey member rm")
    }

    pub fn member_grant(&self, name: &str, env: &str) -> Output {
        self.cmd()
            .args(["member", "grant", name, "-e", env])
            .output()
            .expect("failed to run envkey member grant")
    }

    pub fn member_revoke(&self, name: &str, env: &str) -> Output {
        self.cmd()
            .args(["member", "revoke", name, "-e", env])
            .output()
            .expect("failed to run envkey member revoke")
    }

    pub fn member_ls(&self) -> Output {
        self.cmd()
            .args(["member", "ls"])
            .output()
            .expect("failed to run envkey member ls")
    }

    pub fn rotate_generate(&self, key: &str, len: &str) -> Output {
        self.cmd()
            .args(["rotate", key, "--generate", len])
            .output()
            .expect("failed to run envkey rotate --generate")
    }

    pub fn rotate_all(&self) -> Output {
        self.cmd()
            .args(["rotate", "--all"])
            .output()
            .expect("failed to run envkey rotate --all")
    }

    pub fn run_argv(&self, env: Option<&str>, argv: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.arg("run");
        if let Some(env) = env {
            cmd.args(["-e", env]);
        }
        cmd.arg("--");
        cmd.args(argv);
        cmd.output().expect("failed to run envkey run")
    }

    pub fn export(&self, format: &str) -> Output {
        self.cmd()
            .args(["export", "--format", format])
            .output()
            .expect("failed to run envkey export")
    }

    pub fn import(&self, path: &str) -> Output {
        self.cmd()
            .args(["import", path])
            .output()
            .expect("failed to run envkey import")
    }

    pub fn diff(&self, path: &str) -> Output {
        self.cmd()
            .args(["diff", path])
            .output()
            .expect("failed to run envkey diff")
    }

    pub fn log(&self) -> Output {
        self.cmd().arg("log").output().expect("failed to run envkey log")
    }

    pub fn verify(&self) -> Output {
        self.cmd()
            .arg("verify")
            .output()
            .expect("failed to run envkey verify")
    }

    pub fn doctor(&self) -> Output {
        self.cmd()
            .arg("doctor")
            .output()
            .expect("failed to run envkey doctor")
    }
}
