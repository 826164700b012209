//! apt/dpkg implementation of [`reconcile::Backend`].

use crate::error::{Error, Result};
use crate::retry::{LogCallback, with_retry};
use crate::runner::{CommandRunner, SystemRunner};
use crate::types::AptConfig;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Scheme owned by this backend.
pub const SCHEME: &str = "apt";

const APT_GET: &str = "apt-get";
const APT_MARK: &str = "apt-mark";
const DPKG_QUERY: &str = "dpkg-query";

/// Backend that drives `apt-get`, `apt-mark` and `dpkg-query`.
pub struct AptBackend<R = SystemRunner> {
    runner: R,
    config: AptConfig,
}

impl AptBackend<SystemRunner> {
    /// Create a backend running real commands.
    ///
    /// Returns [`Error::AptNotFound`] if `apt-get` is not in `PATH`.
    pub fn new(config: AptConfig) -> Result<Self> {
        let path = find_apt()?;
        log::debug!("Using {}", path.display());
        Ok(Self::with_runner(SystemRunner, config))
    }
}

impl<R: CommandRunner> AptBackend<R> {
    /// Create a backend over an arbitrary runner.
    pub fn with_runner(runner: R, config: AptConfig) -> Self {
        Self { runner, config }
    }

    /// Active configuration
    pub fn config(&self) -> &AptConfig {
        &self.config
    }

    /// dpkg status of `name`, e.g. `install ok installed`.
    ///
    /// `None` when dpkg has never heard of the package.
    pub fn status(&self, name: &str) -> Result<Option<String>> {
        let out = self.runner.run(DPKG_QUERY, &["-W", "-f=${Status}", "--", name])?;
        if !out.success {
            return Ok(None);
        }
        Ok(Some(out.stdout.trim().to_string()))
    }

    /// Run apt-get non-interactively, retrying transient failures.
    fn apt_get(&self, args: &[&str], package: Option<&str>) -> Result<String> {
        let lock_timeout = format!("DPkg::Lock::Timeout={}", self.config.lock_timeout_secs);
        let mut full = vec!["-y", "-o", lock_timeout.as_str()];
        full.extend_from_slice(args);

        with_retry(&self.config.retry(), Some(&LogCallback), || {
            let out = self.runner.run(APT_GET, &full)?;
            if out.success {
                Ok(out.stdout)
            } else {
                Err(Error::from_apt_output(&out.stderr, package))
            }
        })
    }

    /// Run a mutating apt-get command.
    ///
    /// `Ok(false)` when apt-get ran and failed; only failures to run it at
    /// all are errors.
    fn mutate(&self, args: &[&str], package: Option<&str>) -> anyhow::Result<bool> {
        match self.apt_get(args, package) {
            Ok(stdout) => {
                log::trace!("{stdout}");
                Ok(true)
            }
            Err(e) if e.is_hard() => Err(e.into()),
            Err(e) => {
                log::warn!("apt-get {} failed ({}): {e}", args.join(" "), e.category().description());
                Ok(false)
            }
        }
    }

    fn remove_with(&self, verb: &str, name: &str) -> anyhow::Result<bool> {
        if !self.installed(name)? {
            log::debug!("{name} is not installed, nothing to {verb}");
            return Ok(false);
        }
        if !self.mutate(&[verb, "--", name], Some(name))? {
            return Ok(false);
        }
        Ok(!self.installed(name)?)
    }

    fn installed(&self, name: &str) -> Result<bool> {
        Ok(self.status(name)?.is_some_and(|status| is_installed_status(&status)))
    }
}

impl<R: CommandRunner> reconcile::Backend for AptBackend<R> {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn is_available(&self) -> bool {
        self.runner
            .run(APT_GET, &["--version"])
            .is_ok_and(|out| out.success)
    }

    fn manual_installed(&self) -> anyhow::Result<BTreeSet<String>> {
        let out = self.runner.run(APT_MARK, &["showmanual"])?;
        if !out.success {
            return Err(Error::from_apt_output(&out.stderr, None).into());
        }
        Ok(parse_package_lines(&out.stdout))
    }

    fn is_installed(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.installed(name)?)
    }

    fn install(&self, name: &str) -> anyhow::Result<bool> {
        if self.installed(name)? {
            log::debug!("{name} is already installed");
            return Ok(false);
        }
        if !self.mutate(&["install", "--", name], Some(name))? {
            return Ok(false);
        }
        Ok(self.installed(name)?)
    }

    fn remove(&self, name: &str) -> anyhow::Result<bool> {
        self.remove_with("remove", name)
    }

    fn purge(&self, name: &str) -> anyhow::Result<bool> {
        self.remove_with("purge", name)
    }

    fn refresh_cache(&self) -> anyhow::Result<bool> {
        self.mutate(&["update"], None)
    }

    fn upgrade_all(&self) -> anyhow::Result<bool> {
        self.mutate(&["upgrade"], None)
    }

    fn autoremove(&self) -> anyhow::Result<bool> {
        self.mutate(&["autoremove"], None)
    }
}

/// Locate the apt-get executable.
pub fn find_apt() -> Result<PathBuf> {
    which::which(APT_GET).map_err(|_| Error::AptNotFound)
}

/// Whether a dpkg status triple (`want flag state`) means installed.
///
/// Held packages (`hold ok installed`) count; `deinstall ok config-files`
/// and half-configured states do not.
fn is_installed_status(status: &str) -> bool {
    status.split_whitespace().nth(2) == Some("installed")
}

/// One package name per non-empty line.
fn parse_package_lines(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use reconcile::Backend;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Simulated dpkg database behind apt-get/apt-mark/dpkg-query.
    #[derive(Default)]
    struct FakeDpkg {
        state: Mutex<DpkgState>,
    }

    #[derive(Default)]
    struct DpkgState {
        /// name -> (status, manual)
        packages: BTreeMap<String, (&'static str, bool)>,
        /// Names apt-get cannot locate
        unknown: BTreeSet<String>,
        /// Remaining apt-get runs that fail on the lock
        locked_runs: u32,
        /// Remaining apt-get runs that fail on a broken dpkg
        broken_runs: u32,
        /// Whether apt-get is missing entirely
        missing: bool,
        calls: Vec<String>,
    }

    impl FakeDpkg {
        fn with_installed(self, name: &str, manual: bool) -> Self {
            self.state
                .lock()
                .unwrap()
                .packages
                .insert(name.to_string(), ("install ok installed", manual));
            self
        }

        fn with_status(self, name: &str, status: &'static str) -> Self {
            self.state
                .lock()
                .unwrap()
                .packages
                .insert(name.to_string(), (status, false));
            self
        }

        fn with_unknown(self, name: &str) -> Self {
            self.state.lock().unwrap().unknown.insert(name.to_string());
            self
        }

        fn locked_for(self, runs: u32) -> Self {
            self.state.lock().unwrap().locked_runs = runs;
            self
        }

        fn broken_for(self, runs: u32) -> Self {
            self.state.lock().unwrap().broken_runs = runs;
            self
        }

        fn missing(self) -> Self {
            self.state.lock().unwrap().missing = true;
            self
        }
    }

    impl CommandRunner for FakeDpkg {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("{program} {}", args.join(" ")));

            match program {
                DPKG_QUERY => {
                    assert_eq!(args[2], "--");
                    let name = args[3];
                    Ok(match state.packages.get(name) {
                        Some((status, _)) => CommandOutput::ok(*status),
                        None => CommandOutput::failed(format!(
                            "dpkg-query: no packages found matching {name}"
                        )),
                    })
                }
                APT_MARK => {
                    let manual: Vec<&str> = state
                        .packages
                        .iter()
                        .filter(|(_, (status, manual))| *manual && is_installed_status(status))
                        .map(|(name, _)| name.as_str())
                        .collect();
                    Ok(CommandOutput::ok(format!("{}\n", manual.join("\n"))))
                }
                APT_GET => {
                    if state.missing {
                        return Err(Error::AptNotFound);
                    }
                    if args == ["--version"] {
                        return Ok(CommandOutput::ok("apt 2.6.1 (amd64)"));
                    }
                    assert_eq!(&args[..2], ["-y", "-o"]);
                    assert!(args[2].starts_with("DPkg::Lock::Timeout="));
                    if state.locked_runs > 0 {
                        state.locked_runs -= 1;
                        return Ok(CommandOutput::failed(
                            "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 42 (apt-get)",
                        ));
                    }
                    if state.broken_runs > 0 {
                        state.broken_runs -= 1;
                        return Ok(CommandOutput::failed(
                            "E: Sub-process /usr/bin/dpkg returned an error code (1)",
                        ));
                    }
                    let verb = args[3];
                    let name = match args.get(4) {
                        Some(&"--") => args.get(5).map(|s| (*s).to_string()),
                        Some(arg) => panic!("package argument {arg} not behind --"),
                        None => None,
                    };
                    match (verb, name) {
                        ("install", Some(name)) => {
                            if state.unknown.contains(&name) {
                                return Ok(CommandOutput::failed(format!(
                                    "E: Unable to locate package {name}"
                                )));
                            }
                            state.packages.insert(name, ("install ok installed", true));
                        }
                        ("remove", Some(name)) => {
                            state
                                .packages
                                .insert(name, ("deinstall ok config-files", false));
                        }
                        ("purge", Some(name)) => {
                            state.packages.remove(&name);
                        }
                        ("update" | "upgrade" | "autoremove", None) => {}
                        other => panic!("unexpected apt-get invocation {other:?}"),
                    }
                    Ok(CommandOutput::ok(""))
                }
                other => panic!("unexpected program {other}"),
            }
        }
    }

    fn backend(dpkg: FakeDpkg) -> AptBackend<FakeDpkg> {
        AptBackend::with_runner(
            dpkg,
            AptConfig {
                lock_timeout_secs: 7,
                retry_attempts: 3,
                retry_base_delay_secs: 0,
            },
        )
    }

    fn apt_get_calls(backend: &AptBackend<FakeDpkg>) -> Vec<String> {
        backend
            .runner
            .state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(APT_GET))
            .cloned()
            .collect()
    }

    #[test]
    fn test_installed_status() {
        assert!(is_installed_status("install ok installed"));
        assert!(is_installed_status("hold ok installed"));
        assert!(!is_installed_status("deinstall ok config-files"));
        assert!(!is_installed_status("install ok half-configured"));
        assert!(!is_installed_status(""));
    }

    #[test]
    fn test_manual_installed() {
        let apt = backend(
            FakeDpkg::default()
                .with_installed("vim", true)
                .with_installed("curl", true)
                .with_installed("libc6", false),
        );
        let manual = apt.manual_installed().unwrap();
        assert_eq!(manual.into_iter().collect::<Vec<_>>(), vec!["curl", "vim"]);
    }

    #[test]
    fn test_is_installed() {
        let apt = backend(
            FakeDpkg::default()
                .with_installed("vim", true)
                .with_status("nano", "deinstall ok config-files"),
        );
        assert!(apt.is_installed("vim").unwrap());
        assert!(!apt.is_installed("nano").unwrap());
        assert!(!apt.is_installed("never-heard-of-it").unwrap());
    }

    #[test]
    fn test_install() {
        let apt = backend(FakeDpkg::default());
        assert!(apt.install("htop").unwrap());
        assert!(apt.is_installed("htop").unwrap());
        assert_eq!(
            apt_get_calls(&apt),
            vec!["apt-get -y -o DPkg::Lock::Timeout=7 install -- htop"]
        );
    }

    #[test]
    fn test_package_names_follow_end_of_options() {
        let apt = backend(FakeDpkg::default().with_installed("vim", true));
        // Reaches apt-get as an operand, never as an option
        assert!(apt.install("-oDPkg::Pre-Invoke::=reboot").unwrap());
        assert!(apt.remove("vim").unwrap());

        let calls = apt.runner.state.lock().unwrap().calls.clone();
        assert!(calls.contains(&"dpkg-query -W -f=${Status} -- -oDPkg::Pre-Invoke::=reboot".to_string()));
        assert!(calls.contains(&"apt-get -y -o DPkg::Lock::Timeout=7 install -- -oDPkg::Pre-Invoke::=reboot".to_string()));
        assert!(calls.contains(&"apt-get -y -o DPkg::Lock::Timeout=7 remove -- vim".to_string()));
    }

    #[test]
    fn test_install_already_installed_is_noop() {
        let apt = backend(FakeDpkg::default().with_installed("htop", true));
        assert!(!apt.install("htop").unwrap());
        assert!(apt_get_calls(&apt).is_empty());
    }

    #[test]
    fn test_install_unknown_package_is_soft_failure() {
        let apt = backend(FakeDpkg::default().with_unknown("nosuchpkg"));
        assert!(!apt.install("nosuchpkg").unwrap());
        // Not retryable, so only one attempt
        assert_eq!(apt_get_calls(&apt).len(), 1);
    }

    #[test]
    fn test_install_retries_lock() {
        let apt = backend(FakeDpkg::default().locked_for(2));
        assert!(apt.install("htop").unwrap());
        assert_eq!(apt_get_calls(&apt).len(), 3);
    }

    #[test]
    fn test_install_gives_up_on_lock() {
        let apt = backend(FakeDpkg::default().locked_for(10));
        assert!(!apt.install("htop").unwrap());
        assert_eq!(apt_get_calls(&apt).len(), 3);
        assert!(!apt.is_installed("htop").unwrap());
    }

    #[test]
    fn test_missing_apt_is_hard_error() {
        let apt = backend(FakeDpkg::default().missing());
        let err = apt.install("htop").unwrap_err();
        assert!(err.to_string().contains("apt-get not found"));
        assert!(!apt.is_available());
    }

    #[test]
    fn test_remove_keeps_config() {
        let apt = backend(FakeDpkg::default().with_installed("vim", true));
        assert!(apt.remove("vim").unwrap());
        assert_eq!(
            apt.status("vim").unwrap().as_deref(),
            Some("deinstall ok config-files")
        );
        assert!(!apt.remove("vim").unwrap());
    }

    #[test]
    fn test_purge() {
        let apt = backend(FakeDpkg::default().with_installed("vim", true));
        assert!(apt.purge("vim").unwrap());
        assert_eq!(apt.status("vim").unwrap(), None);
    }

    #[test]
    fn test_purge_not_installed_is_noop() {
        let apt = backend(FakeDpkg::default());
        assert!(!apt.purge("vim").unwrap());
        assert!(apt_get_calls(&apt).is_empty());
    }

    #[test]
    fn test_remove_failure() {
        let apt = backend(FakeDpkg::default().with_installed("vim", true).broken_for(1));
        assert!(!apt.remove("vim").unwrap());
        assert!(apt.is_installed("vim").unwrap());
    }

    #[test]
    fn test_maintenance_commands() {
        let apt = backend(FakeDpkg::default());
        assert!(apt.refresh_cache().unwrap());
        assert!(apt.upgrade_all().unwrap());
        assert!(apt.autoremove().unwrap());
        assert_eq!(
            apt_get_calls(&apt),
            vec![
                "apt-get -y -o DPkg::Lock::Timeout=7 update",
                "apt-get -y -o DPkg::Lock::Timeout=7 upgrade",
                "apt-get -y -o DPkg::Lock::Timeout=7 autoremove",
            ]
        );
    }

    #[test]
    fn test_works_through_registry() {
        use reconcile::{BackendRegistry, PackageId};
        use std::sync::Arc;

        let registry = BackendRegistry::new(Arc::new(backend(FakeDpkg::default())));
        let id = PackageId::parse("htop", &registry).unwrap();
        assert_eq!(id.canonical(), "apt://htop");
        assert!(registry.get("apt").is_some());
    }
}
