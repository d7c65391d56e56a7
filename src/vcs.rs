use chrono::{Local, NaiveDate};
use eyre::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Arguments for the three git invocations: stage the notes, commit, tag.
pub fn git_commands(output_dir: &Path, count: usize, today: NaiveDate) -> [Vec<OsString>; 3] {
    let today = today.format("%Y-%m-%d").to_string();

    // Literal pathspec; git does the glob matching, including into notes/.
    let mut pathspec = output_dir.as_os_str().to_os_string();
    pathspec.push("/*.md");

    [
        vec!["add".into(), pathspec],
        vec![
            "commit".into(),
            "-m".into(),
            format!("Conversion of {} conversations on {}", count, today).into(),
        ],
        vec!["tag".into(), today.into()],
    ]
}

/// Stage, commit and tag the generated notes.
///
/// Exit statuses are not checked: a failed `git commit` (nothing to commit,
/// not a repository) does not stop the tag attempt. Failing to launch git
/// at all is an error.
pub fn commit_to_git(output_dir: &Path, count: usize) -> Result<()> {
    let today = Local::now().date_naive();
    for args in git_commands(output_dir, count, today) {
        let status = Command::new("git").args(&args).status().wrap_err_with(|| {
            format!(
                "Failed to execute 'git {}'. Is git installed?",
                args[0].to_string_lossy()
            )
        })?;
        if !status.success() {
            tracing::debug!(command = ?args, %status, "git exited unsuccessfully");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_add_commit_tag() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let [add, commit, tag] = git_commands(Path::new("/work/output_dir"), 12, today);

        assert_eq!(add, ["add", "/work/output_dir/*.md"]);
        assert_eq!(
            commit,
            ["commit", "-m", "Conversion of 12 conversations on 2024-03-09"]
        );
        assert_eq!(tag, ["tag", "2024-03-09"]);
    }
}
