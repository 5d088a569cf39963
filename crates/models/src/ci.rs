use std::collections::HashMap;

/// What Travis tells us about the current build, read from its environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravisContext {
    pub branch: Option<String>,
    /// `None` when the build was not triggered by a pull request.
    pub pull_request: Option<u64>,
    pub repo_slug: Option<String>,
    pub commit: Option<String>,
}

/// CI environment detection. Only Travis is recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiContext {
    pub travis: Option<TravisContext>,
}

impl CiContext {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if vars.get("TRAVIS").map(String::as_str) != Some("true") {
            return Self { travis: None };
        }

        // "false" when the build doesn't come from a PR
        let pull_request = vars
            .get("TRAVIS_PULL_REQUEST")
            .and_then(|value| value.parse::<u64>().ok());

        Self {
            travis: Some(TravisContext {
                branch: vars.get("TRAVIS_BRANCH").cloned(),
                pull_request,
                repo_slug: vars.get("TRAVIS_REPO_SLUG").cloned(),
                commit: vars.get("TRAVIS_COMMIT").cloned(),
            }),
        }
    }

    pub fn is_travis(&self) -> bool {
        self.travis.is_some()
    }
}
