use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use anyhow::Result;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Command that is not a builtin.
pub struct ExternalCommand {
    /// The name as typed, passed to the child as `argv[0]`.
    name: OsString,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, program: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }
}

/// Resolves `name` against the environment's current `PATH`.
pub(crate) fn lookup(env: &Environment, name: &str) -> Option<PathBuf> {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    find_command_path(OsStr::new(&search_paths), Path::new(name)).map(Cow::into_owned)
}

/// Command factory that runs executables found on `PATH`.
pub(crate) struct PathExecutor;

impl CommandFactory for PathExecutor {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let program = lookup(env, name)?;
        debug!(name, program = %program.display(), "resolved external command");
        Some(Box::new(ExternalCommand::new(
            name.into(),
            program,
            args.iter().map(OsString::from).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        stderr: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(stdin.stdio())
            .stdout(stdout.stdio())
            .stderr(stderr.stdio())
            .envs(env.vars.iter());
        set_arg0(&mut cmd, &self.name);

        let mut child = cmd.spawn().map_err(|source| {
            warn!(program = %self.program.display(), %source, "failed to spawn");
            ShellError::Spawn {
                name: self.name.to_string_lossy().into_owned(),
                source,
            }
        })?;
        let exit_status = child.wait()?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

#[cfg(unix)]
fn set_arg0(cmd: &mut Command, name: &OsStr) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut Command, _name: &OsStr) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is executable.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it is executable.
/// - `./foo` on Unix or any relative path on other platforms: returns it if it is executable.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   in order and return the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub(crate) fn find_command_path<'a>(
    search_paths: &OsStr,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && is_executable(path) {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> search in current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable(path))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::io_adapters::InheritedStdin;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn run(cmd: ExternalCommand, stdout: File, stderr: File) -> ExitCode {
        Box::new(cmd)
            .execute(
                Box::new(InheritedStdin(std::io::stdin())),
                Box::new(stdout),
                Box::new(stderr),
                &mut Environment::new(),
            )
            .unwrap()
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        let found = res.unwrap();
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        let res = find_command_path(osstr("/bin"), path);
        assert!(
            res.is_none(),
            "Expected not to find /bin/nonexisting via absolute path"
        );
    }

    #[test]
    fn single_component_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("sh"));
        let found = res.expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn first_path_entry_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let expected = write_script(first.path(), "tool", "exit 0");
        write_script(second.path(), "tool", "exit 0");

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_command_path(&search, Path::new("tool")).unwrap();
        assert_eq!(found.as_ref(), expected);
    }

    #[test]
    fn non_executable_entries_are_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("tool"), "not a program").unwrap();
        fs::create_dir(first.path().join("dir_tool")).unwrap();
        let expected = write_script(second.path(), "tool", "exit 0");

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_command_path(&search, Path::new("tool")).unwrap();
        assert_eq!(found.as_ref(), expected);
        assert!(find_command_path(&search, Path::new("dir_tool")).is_none());
    }

    #[test]
    fn multiple_components_resolve_without_path_search() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        let script = write_script(&dir.path().join("bin"), "tool", "exit 0");

        let found = find_command_path(osstr("/does/not/matter"), &script).unwrap();
        assert_eq!(found.as_ref(), script);
        assert!(find_command_path(dir.path().as_os_str(), Path::new("bin/missing")).is_none());
    }

    #[test]
    fn lookup_uses_environment_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "hello_tool", "exit 0");
        let mut env = Environment::new();
        env.set_var("PATH", dir.path().to_string_lossy());
        assert_eq!(lookup(&env, "hello_tool"), Some(script));

        env.set_var("PATH", "");
        assert_eq!(lookup(&env, "hello_tool"), None);
    }

    #[test]
    fn child_output_goes_to_given_streams() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "talk", "echo \"out $1\"\necho \"err $2\" >&2");
        let out_path = dir.path().join("out.txt");
        let err_path = dir.path().join("err.txt");

        let cmd = ExternalCommand::new("talk".into(), script, vec!["a".into(), "b".into()]);
        let code = run(
            cmd,
            File::create(&out_path).unwrap(),
            File::create(&err_path).unwrap(),
        );
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(out_path).unwrap(), "out a\n");
        assert_eq!(fs::read_to_string(err_path).unwrap(), "err b\n");
    }

    #[test]
    fn nonzero_exit_status_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "fail", "exit 3");
        let sink = dir.path().join("sink");

        let cmd = ExternalCommand::new("fail".into(), script, Vec::new());
        let code = run(cmd, File::create(&sink).unwrap(), File::create(&sink).unwrap());
        assert_eq!(code, 3);
    }

    #[test]
    fn argv0_is_the_typed_name() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("myshell");
        std::os::unix::fs::symlink("/bin/sh", &link).unwrap();
        let out_path = dir.path().join("out.txt");

        let cmd = ExternalCommand::new(
            "myshell".into(),
            link,
            vec!["-c".into(), "echo \"$0\"".into()],
        );
        run(
            cmd,
            File::create(&out_path).unwrap(),
            File::create(dir.path().join("err.txt")).unwrap(),
        );
        assert_eq!(fs::read_to_string(out_path).unwrap(), "myshell\n");
    }

    #[test]
    fn spawn_failure_is_a_shell_error() {
        let dir = tempfile::tempdir().unwrap();
        // Executable, but its interpreter does not exist.
        let path = dir.path().join("broken");
        fs::write(&path, "#!/nonexistent/interpreter\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        let sink = dir.path().join("sink");

        let cmd = ExternalCommand::new("broken".into(), path, Vec::new());
        let err = Box::new(cmd)
            .execute(
                Box::new(InheritedStdin(std::io::stdin())),
                Box::new(File::create(&sink).unwrap()),
                Box::new(File::create(&sink).unwrap()),
                &mut Environment::new(),
            )
            .unwrap_err();
        let shell_err = err.downcast::<ShellError>().unwrap();
        assert!(matches!(shell_err, ShellError::Spawn { ref name, .. } if name == "broken"));
    }
}
