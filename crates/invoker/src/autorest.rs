use sdk_models::SdkError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, instrument};

/// Command line of one AutoRest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutorestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl AutorestCommand {
    /// `[mono] <exe> -i <swagger> -o <output> <options...>`
    pub fn new(
        executable: &Path,
        use_mono: bool,
        swagger_file: &Path,
        output_dir: &Path,
        options: Vec<String>,
    ) -> Self {
        let executable = executable.display().to_string();
        let (program, mut args) = if use_mono {
            ("mono".to_string(), vec![executable])
        } else {
            (executable, Vec::new())
        };
        args.push("-i".to_string());
        args.push(swagger_file.display().to_string());
        args.push("-o".to_string());
        args.push(output_dir.display().to_string());
        args.extend(options);
        Self { program, args }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run AutoRest and return its combined output.
#[instrument(skip(command), fields(program = %command.program))]
pub async fn generate_code(command: &AutorestCommand) -> Result<String, SdkError> {
    info!("Autorest cmd line:\n{}", command.command_line());

    let output = Command::new(&command.program)
        .args(&command.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            error!("Unable to start Autorest: {}", e);
            SdkError::AutorestFailed {
                status: -1,
                output: e.to_string(),
            }
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        let status = output.status.code().unwrap_or(-1);
        error!("Autorest exited with {}", status);
        error!("{}", combined);
        return Err(SdkError::AutorestFailed {
            status,
            output: combined,
        });
    }

    info!("{}", combined);
    Ok(combined)
}
