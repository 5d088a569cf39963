use serde::{Deserialize, Serialize};

/// Tool settings. Loaded by the binaries from defaults, an optional TOML file
/// and `SWAGGER_TO_SDK_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub github: GithubSettings,
    pub autorest: AutorestSettings,
    pub git: GitSettings,
    pub branches: BranchSettings,
    pub image: ImageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GithubSettings {
    pub api_url: String,
    pub host: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AutorestSettings {
    pub download_base_url: String,
    pub executable: String,
    pub use_mono: bool,
    pub max_package_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GitSettings {
    pub fallback_user_email: String,
    pub fallback_user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BranchSettings {
    pub default_branch: String,
    pub travis_pr_branch: String,
    pub travis_branch: String,
    pub commit_message: String,
    pub base_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageSettings {
    pub repository: String,
    pub base_image: String,
    pub keyserver: String,
    pub key_fingerprint: String,
    pub package_source: String,
    pub package_source_list: String,
    pub packages: Vec<String>,
    pub manifest: String,
    pub locale: String,
    pub script: String,
    pub script_path: String,
    pub interpreter: String,
    pub workdir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github: GithubSettings {
                api_url: "https://api.github.com".to_string(),
                host: "github.com".to_string(),
                user_agent: "swagger-to-sdk".to_string(),
            },
            autorest: AutorestSettings {
                download_base_url: "https://www.myget.org/F/autorest/api/v2/package/AutoRest/"
                    .to_string(),
                executable: "AutoRest.exe".to_string(),
                use_mono: !cfg!(windows),
                max_package_size_mb: 200,
            },
            git: GitSettings {
                fallback_user_email: "autorestci@microsoft.com".to_string(),
                fallback_user_name: "SwaggerToSDK Automation".to_string(),
            },
            branches: BranchSettings {
                default_branch: "autorest".to_string(),
                travis_pr_branch: "RestAPI-PR{number}".to_string(),
                travis_branch: "RestAPI-{branch}".to_string(),
                commit_message: "Generated from {hexsha}".to_string(),
                base_branch: "master".to_string(),
            },
            image: ImageSettings {
                repository: "swagger-to-sdk".to_string(),
                base_image: "ubuntu:16.04".to_string(),
                keyserver: "hkp://keyserver.ubuntu.com:80".to_string(),
                key_fingerprint: "3FA7E0328081BFF6A14DA29AA6A19B38D3D831EF".to_string(),
                package_source: "deb http://download.mono-project.com/repo/debian wheezy main"
                    .to_string(),
                package_source_list: "/etc/apt/sources.list.d/mono-xamarin.list".to_string(),
                packages: vec![
                    "git".to_string(),
                    "locales".to_string(),
                    "mono-complete".to_string(),
                    "python3".to_string(),
                    "python3-pip".to_string(),
                ],
                manifest: "requirements.txt".to_string(),
                locale: "en_US.UTF-8".to_string(),
                script: "SwaggerToSdk.py".to_string(),
                script_path: "/SwaggerToSdk.py".to_string(),
                interpreter: "python3".to_string(),
                workdir: "/git-restapi".to_string(),
            },
        }
    }
}
