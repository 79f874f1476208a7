//! The external learner: a multiclass SVM trainer and classifier driven through files.
//!
//! Training files hold one line per instance, `<class> <feature>:1 <feature>:1 ...` with features in
//! ascending id order. The classifier writes one line per test instance; the first token is the
//! predicted class and is ignored, the remaining tokens are one score per class starting at class 1.

use fs_err::File;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    io::{self, BufRead, BufReader, Read, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How to run the learner. Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearnerConfig {
    pub learn_program: PathBuf,
    pub classify_program: PathBuf,
    /// Regularisation constant passed as `-c`.
    pub c: f64,
    /// Upper bound for one learner invocation.
    pub timeout_secs: u64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            learn_program: "svm_multiclass_learn".into(),
            classify_program: "svm_multiclass_classify".into(),
            c: 1.0,
            timeout_secs: 3600,
        }
    }
}

impl LearnerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(serde_json::from_reader(BufReader::new(File::open(
            path.as_ref(),
        )?))?)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Trains `model` from `training`. The learner's stdout is written to `log`.
    pub(crate) fn learn(
        &self,
        item: &str,
        training: &Path,
        model: &Path,
        log: &Path,
    ) -> Result<(), Error> {
        let (log, _) = File::create(log)?.into_parts();
        let c = self.c.to_string();

        run(
            item,
            &self.learn_program,
            &[
                OsStr::new("-c"),
                OsStr::new(&c),
                training.as_os_str(),
                model.as_os_str(),
            ],
            Stdio::from(log),
            self.timeout(),
        )
    }

    /// Classifies `test` with `model`, writing the scores to `output`.
    pub(crate) fn classify(
        &self,
        item: &str,
        test: &Path,
        model: &Path,
        output: &Path,
    ) -> Result<(), Error> {
        run(
            item,
            &self.classify_program,
            &[test.as_os_str(), model.as_os_str(), output.as_os_str()],
            Stdio::null(),
            self.timeout(),
        )
    }
}

fn wait(child: &mut Child, timeout: Duration) -> io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs `program` to completion, killing it once `timeout` is exceeded.
fn run(
    item: &str,
    program: &Path,
    args: &[&OsStr],
    stdout: Stdio,
    timeout: Duration,
) -> Result<(), Error> {
    let program_name = program.display().to_string();
    debug!("Running {} {:?} for {}.", program_name, args, item);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|error| {
            warn!("Could not start {}: {}", program_name, error);
            Error::Subprocess {
                item: item.to_string(),
                program: program_name.clone(),
                code: None,
            }
        })?;

    match wait(&mut child, timeout)? {
        Some(status) if status.success() => Ok(()),
        Some(status) => Err(Error::Subprocess {
            item: item.to_string(),
            program: program_name,
            code: status.code(),
        }),
        None => {
            // the process may have exited in the meantime, in which case kill fails harmlessly
            let _ = child.kill();
            child.wait()?;
            Err(Error::Timeout {
                item: item.to_string(),
                program: program_name,
                seconds: timeout.as_secs(),
            })
        }
    }
}

/// Writes one line of a training or test file. Only feature presence is encoded.
pub(crate) fn write_line<W: Write>(
    writer: &mut W,
    label: u32,
    vector: &[(u32, u32)],
) -> io::Result<()> {
    write!(writer, "{}", label)?;
    for (id, _) in vector {
        write!(writer, " {}:1", id)?;
    }
    writeln!(writer)
}

/// Reads the per-class scores of every line of a classifier output.
pub(crate) fn read_scores<R: Read>(reader: R, path: &Path) -> Result<Vec<Vec<f64>>, Error> {
    let malformed = |reason: String| Error::MalformedArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let mut scores = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .skip(1)
            .map(|value| {
                value.parse::<f64>().map_err(|_| {
                    malformed(format!("line {}: '{}' is not a score", i + 1, value))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        scores.push(values);
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_presence_only() {
        let mut buffer = Vec::new();
        write_line(&mut buffer, 3, &[(1, 2), (7, 1)]).unwrap();
        write_line(&mut buffer, 1, &[]).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "3 1:1 7:1\n1\n");
    }

    #[test]
    fn reads_scores_skipping_prediction() {
        let output = "2 0.2 0.9 -1.5e-1\n\n1 3 4 5\n";
        let scores = read_scores(output.as_bytes(), Path::new("out")).unwrap();

        assert_eq!(scores, vec![vec![0.2, 0.9, -0.15], vec![3., 4., 5.]]);
    }

    #[test]
    fn garbage_scores_are_malformed() {
        assert!(matches!(
            read_scores("1 0.5 high\n".as_bytes(), Path::new("out")),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: LearnerConfig = serde_json::from_str(r#"{ "c": 0.5 }"#).unwrap();

        assert_eq!(config.c, 0.5);
        assert_eq!(config.learn_program, PathBuf::from("svm_multiclass_learn"));
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn missing_program_is_a_subprocess_error() {
        let result = run(
            "bank.n",
            Path::new("/nonexistent/learner"),
            &[],
            Stdio::null(),
            Duration::from_secs(1),
        );

        assert!(matches!(
            result,
            Err(Error::Subprocess { item, code: None, .. }) if item == "bank.n"
        ));
    }

    #[test]
    fn unwritable_log_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("missing").join("bank.n.model.log");

        let result = LearnerConfig::default().learn(
            "bank.n",
            &dir.path().join("bank.n.train"),
            &dir.path().join("bank.n.model"),
            &log,
        );

        match result {
            Err(Error::Io(error)) => assert!(error.to_string().contains("bank.n.model.log")),
            other => panic!("expected an io error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn reports_exit_codes_and_timeouts() {
        let failing = run(
            "bank.n",
            Path::new("sh"),
            &[OsStr::new("-c"), OsStr::new("exit 3")],
            Stdio::null(),
            Duration::from_secs(10),
        );
        assert!(matches!(failing, Err(Error::Subprocess { code: Some(3), .. })));

        let start = Instant::now();
        let slow = run(
            "bank.n",
            Path::new("sleep"),
            &[OsStr::new("10")],
            Stdio::null(),
            Duration::from_millis(200),
        );
        assert!(matches!(slow, Err(Error::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
