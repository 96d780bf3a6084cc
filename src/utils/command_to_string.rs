use std::ffi::OsStr;

/// Render a program and its arguments the way it would be typed in a shell.
/// Arguments holding whitespace are single-quoted so the log line can be pasted back
pub fn command_to_string<P, I, S>(program: P, args: I) -> String
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = program.as_ref().to_string_lossy().into_owned();
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('\'');
            line.push_str(&arg);
            line.push('\'');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_to_string() {
        assert_eq!(
            command_to_string("samtools", ["sort", "-o", "out.bam", "in.bam"]),
            "samtools sort -o out.bam in.bam"
        );
        assert_eq!(
            command_to_string("bash", ["-c", "echo hi"]),
            "bash -c 'echo hi'"
        );
        assert_eq!(command_to_string("true", Vec::<String>::new()), "true");
    }
}
