//! Git command construction for the repository sync recipe.
//!
//! Only the argv is built here; running it is the job of a
//! [`ProcessRunner`](crate::process::ProcessRunner). This uses the system
//! `git` command, so SSH keys, credential helpers and anything else set up
//! in `~/.gitconfig` apply unchanged.

/// Builds the git invocations used to sync a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommands {
    program: String,
    remote: String,
}

impl GitCommands {
    pub fn new(program: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            remote: remote.into(),
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn git(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(args.iter().map(|arg| arg.to_string()))
            .collect()
    }

    /// `git fetch <remote>`
    pub fn fetch(&self) -> Vec<String> {
        self.git(&["fetch", &self.remote])
    }

    /// `git reset --hard`
    pub fn reset_hard(&self) -> Vec<String> {
        self.git(&["reset", "--hard"])
    }

    /// `git clean -fd`
    pub fn clean(&self) -> Vec<String> {
        self.git(&["clean", "-fd"])
    }

    /// `git checkout <remote>/<environment>`
    pub fn checkout(&self, environment: &str) -> Vec<String> {
        let remote_ref = remote_ref(&self.remote, environment);
        self.git(&["checkout", &remote_ref])
    }

    /// The full sync sequence, in the order it must run.
    pub fn sync_sequence(&self, environment: &str) -> Vec<Vec<String>> {
        vec![
            self.fetch(),
            self.reset_hard(),
            self.clean(),
            self.checkout(environment),
        ]
    }
}

impl Default for GitCommands {
    fn default() -> Self {
        Self::new(crate::defaults::GIT_PROGRAM, crate::defaults::REMOTE)
    }
}

/// The remote-tracking ref an environment maps to, e.g. `origin/production`.
pub fn remote_ref(remote: &str, environment: &str) -> String {
    format!("{}/{}", remote, environment)
}
