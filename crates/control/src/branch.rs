use crate::InitialPr;
use sdk_models::{BranchSettings, CiContext};
use tracing::info;

/// Branch receiving the generated code.
///
/// An explicit name wins. Outside Travis the default branch is used; under
/// Travis the branch is named after the initial PR, or after the Travis
/// branch when the build has no PR.
pub fn compute_branch_name(
    explicit: Option<&str>,
    ci: &CiContext,
    initial_pr: Option<&InitialPr>,
    settings: &BranchSettings,
) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }
    let Some(travis) = &ci.travis else {
        return settings.default_branch.clone();
    };
    info!("Travis detected");
    match initial_pr {
        Some(pr) => settings
            .travis_pr_branch
            .replace("{number}", &pr.pull.number.to_string()),
        None => settings
            .travis_branch
            .replace("{branch}", travis.branch.as_deref().unwrap_or_default()),
    }
}

pub fn commit_message(template: &str, hexsha: &str) -> String {
    template.replace("{hexsha}", hexsha)
}
