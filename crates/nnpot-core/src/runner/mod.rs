//! Launching the external trainer and MD binaries.

use crate::domain::{NnpError, NnpResult};
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    NnpScaling,
    NnpTrain,
    NnpPredict,
    Lammps,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Tool::NnpScaling,
        Tool::NnpTrain,
        Tool::NnpPredict,
        Tool::Lammps,
    ];

    pub const fn default_program(self) -> &'static str {
        match self {
            Self::NnpScaling => "nnp-scaling",
            Self::NnpTrain => "nnp-train",
            Self::NnpPredict => "nnp-predict",
            Self::Lammps => "lmp",
        }
    }

    /// Environment variable that overrides the program name.
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::NnpScaling => "NNP_SCALING_BIN",
            Self::NnpTrain => "NNP_TRAIN_BIN",
            Self::NnpPredict => "NNP_PREDICT_BIN",
            Self::Lammps => "LAMMPS_BIN",
        }
    }

    const fn placeholder(self) -> &'static str {
        match self {
            Self::NnpScaling => "RUN.NNP_SCALING",
            Self::NnpTrain => "RUN.NNP_TRAIN",
            Self::NnpPredict => "RUN.NNP_PREDICT",
            Self::Lammps => "RUN.LAMMPS",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::NnpScaling => 0,
            Self::NnpTrain => 1,
            Self::NnpPredict => 2,
            Self::Lammps => 3,
        }
    }
}

/// Where a tool's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Capture,
    /// Redirect into a file, created or truncated before launch.
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Program names for every external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    programs: [String; 4],
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            programs: Tool::ALL.map(|tool| tool.default_program().to_string()),
        }
    }
}

impl Toolchain {
    /// Defaults, overridden by `NNP_SCALING_BIN`, `NNP_TRAIN_BIN`,
    /// `NNP_PREDICT_BIN` and `LAMMPS_BIN` when set.
    pub fn from_env() -> Self {
        let mut toolchain = Self::default();
        for tool in Tool::ALL {
            if let Some(program) = env::var(tool.env_var())
                .ok()
                .filter(|value| !value.trim().is_empty())
            {
                tracing::debug!(
                    tool = tool.default_program(),
                    %program,
                    "program overridden from environment"
                );
                toolchain.programs[tool.index()] = program;
            }
        }
        toolchain
    }

    pub fn with_program(mut self, tool: Tool, program: impl Into<String>) -> Self {
        self.programs[tool.index()] = program.into();
        self
    }

    pub fn program(&self, tool: Tool) -> &str {
        &self.programs[tool.index()]
    }

    /// Resolves the tool's executable or fails naming it.
    pub fn require(&self, tool: Tool) -> NnpResult<PathBuf> {
        let program = self.program(tool);
        which(program).ok_or_else(|| {
            NnpError::io_system(
                "IO.TOOL_NOT_FOUND",
                format!("{} has not been found", program),
            )
        })
    }

    /// Runs `tool args...` in `cwd` and blocks until it exits.
    pub fn run(
        &self,
        tool: Tool,
        args: &[&str],
        cwd: &Path,
        sink: OutputSink,
    ) -> NnpResult<ToolOutput> {
        let program = self.program(tool);
        let executable = self.require(tool)?;
        tracing::info!(
            tool = program,
            executable = %executable.display(),
            ?args,
            cwd = %cwd.display(),
            "launching external tool"
        );

        let mut command = Command::new(&executable);
        command.args(args).current_dir(cwd).stdin(Stdio::null());

        if let OutputSink::File(path) = &sink {
            let target = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            let file = File::create(&target).map_err(|source| {
                NnpError::io_system(
                    "IO.TOOL_OUTPUT",
                    format!(
                        "failed to create output file '{}': {}",
                        target.display(),
                        source
                    ),
                )
            })?;
            command.stdout(Stdio::from(file));
        }

        let output = command.output().map_err(|source| {
            NnpError::io_system(
                "IO.TOOL_EXEC",
                format!("failed to execute '{}': {}", program, source),
            )
        })?;

        let stdout = match &sink {
            OutputSink::Capture => String::from_utf8_lossy(&output.stdout).into_owned(),
            OutputSink::File(path) => {
                let target = cwd.join(path);
                std::fs::read_to_string(&target).map_err(|source| {
                    NnpError::io_system(
                        "IO.TOOL_OUTPUT",
                        format!(
                            "failed to read output file '{}': {}",
                            target.display(),
                            source
                        ),
                    )
                })?
            }
        };
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            tracing::debug!(tool = program, "external tool finished");
            return Ok(ToolOutput { stdout, stderr });
        }

        let status_text = output.status.code().map_or_else(
            || format!("{} was terminated by signal", program),
            |code| format!("{} exited with return code {}", program, code),
        );
        let detail = failure_detail(&stdout).or_else(|| failure_detail(&stderr));
        let message = match detail {
            Some(detail) => format!("{}: {}", status_text, detail),
            None => status_text,
        };
        tracing::warn!(tool = program, %message, "external tool failed");
        Err(NnpError::computation(tool.placeholder(), message))
    }
}

/// Everything from the first `ERROR` line on, joined by `, `; otherwise the
/// last line.
pub fn failure_detail(output: &str) -> Option<String> {
    let lines = output.lines().collect::<Vec<_>>();
    match lines.iter().position(|line| line.starts_with("ERROR")) {
        Some(first) => Some(lines[first..].join(", ")),
        None => lines
            .iter()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.to_string()),
    }
}

/// Resolves `program` against `PATH` unless it already names a path.
/// Relative paths are anchored at the current directory so the result stays
/// valid when the tool is launched from a scratch directory.
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            env::current_dir().ok()?.join(candidate)
        };
        return is_executable(&candidate).then_some(candidate);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|directory| directory.join(program))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[cfg(test)]
mod tests {
    use super::{Tool, Toolchain, failure_detail, which};

    #[test]
    fn failure_detail_prefers_error_block() {
        let output = "Reading input.nn\nERROR: symmetry function missing\nAborting\n";
        assert_eq!(
            failure_detail(output).as_deref(),
            Some("ERROR: symmetry function missing, Aborting")
        );
        assert_eq!(
            failure_detail("step 1\nstep 2\n").as_deref(),
            Some("step 2")
        );
        assert_eq!(failure_detail(""), None);
    }

    #[test]
    fn toolchain_overrides_single_programs() {
        let toolchain = Toolchain::default().with_program(Tool::Lammps, "/opt/lammps/lmp_mpi");

        assert_eq!(toolchain.program(Tool::NnpTrain), "nnp-train");
        assert_eq!(toolchain.program(Tool::Lammps), "/opt/lammps/lmp_mpi");
    }

    #[test]
    fn missing_tools_are_reported_by_name() {
        let toolchain =
            Toolchain::default().with_program(Tool::NnpTrain, "nnp-train-definitely-not-installed");

        let error = toolchain
            .require(Tool::NnpTrain)
            .expect_err("binary does not exist");
        assert_eq!(error.placeholder(), "IO.TOOL_NOT_FOUND");
        assert!(error.message().contains("nnp-train-definitely-not-installed"));
        assert!(which("/nonexistent/dir/nnp-train").is_none());
    }

    #[cfg(unix)]
    mod unix {
        use super::super::{OutputSink, Tool, Toolchain};
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;
        use tempfile::TempDir;

        fn script(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("script staged");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("script made executable");
            path.display().to_string()
        }

        #[test]
        fn successful_runs_capture_or_redirect_stdout() {
            let temp = TempDir::new().expect("tempdir should be created");
            let program = script(temp.path(), "fake-train", "echo \"trained $1\"");
            let toolchain = Toolchain::default().with_program(Tool::NnpTrain, program);

            let captured = toolchain
                .run(Tool::NnpTrain, &["input.nn"], temp.path(), OutputSink::Capture)
                .expect("script succeeds");
            assert_eq!(captured.stdout, "trained input.nn\n");

            let redirected = toolchain
                .run(
                    Tool::NnpTrain,
                    &["input.nn"],
                    temp.path(),
                    OutputSink::File("training_output".into()),
                )
                .expect("script succeeds");
            assert_eq!(redirected.stdout, "trained input.nn\n");
            assert_eq!(
                fs::read_to_string(temp.path().join("training_output")).expect("log written"),
                "trained input.nn\n"
            );
        }

        #[test]
        fn relative_overrides_resolve_against_the_launch_directory() {
            let tools = TempDir::new_in(".").expect("tool dir inside the crate");
            script(tools.path(), "fake-train", "echo \"trained in $(pwd)\"");
            let dir_name = tools
                .path()
                .file_name()
                .and_then(|name| name.to_str())
                .expect("tempdir name is utf-8");
            let relative = format!("./{dir_name}/fake-train");
            let toolchain = Toolchain::default().with_program(Tool::NnpTrain, relative.clone());

            let resolved = toolchain.require(Tool::NnpTrain).expect("relative tool exists");
            assert!(resolved.is_absolute());
            assert!(resolved.ends_with(Path::new(dir_name).join("fake-train")));

            let scratch = TempDir::new().expect("scratch dir should be created");
            let output = toolchain
                .run(Tool::NnpTrain, &[], scratch.path(), OutputSink::Capture)
                .expect("tool launches from the scratch directory");
            assert!(output.stdout.starts_with("trained in "));
            assert_eq!(toolchain.program(Tool::NnpTrain), relative);
        }

        #[test]
        fn failure_detail_falls_back_to_stderr() {
            let temp = TempDir::new().expect("tempdir should be created");
            let program = script(
                temp.path(),
                "fake-scaling",
                "echo 'reading input.nn' >&2\necho 'ERROR: no symmetry functions' >&2\nexit 2",
            );
            let toolchain = Toolchain::default().with_program(Tool::NnpScaling, program.clone());

            let error = toolchain
                .run(Tool::NnpScaling, &[], temp.path(), OutputSink::Capture)
                .expect_err("script exits with 2");
            assert_eq!(error.placeholder(), "RUN.NNP_SCALING");
            assert_eq!(
                error.message(),
                format!("{program} exited with return code 2: ERROR: no symmetry functions")
            );
        }

        #[test]
        fn missing_redirected_output_is_an_io_error() {
            let temp = TempDir::new().expect("tempdir should be created");
            let program = script(temp.path(), "fake-train", "rm -f training_output\necho done");
            let toolchain = Toolchain::default().with_program(Tool::NnpTrain, program);

            let error = toolchain
                .run(
                    Tool::NnpTrain,
                    &[],
                    temp.path(),
                    OutputSink::File("training_output".into()),
                )
                .expect_err("redirect target was removed");
            assert_eq!(error.placeholder(), "IO.TOOL_OUTPUT");
            assert!(error.message().contains("training_output"));
        }

        #[test]
        fn failed_runs_report_exit_code_and_error_block() {
            let temp = TempDir::new().expect("tempdir should be created");
            let program = script(
                temp.path(),
                "fake-predict",
                "echo start\necho 'ERROR: no structures'\necho bye\nexit 3",
            );
            let toolchain = Toolchain::default().with_program(Tool::NnpPredict, program.clone());

            let error = toolchain
                .run(Tool::NnpPredict, &[], temp.path(), OutputSink::Capture)
                .expect_err("script exits with 3");
            assert_eq!(error.placeholder(), "RUN.NNP_PREDICT");
            assert_eq!(error.exit_code(), 4);
            assert_eq!(
                error.message(),
                format!("{program} exited with return code 3: ERROR: no structures, bye")
            );
        }
    }
}
