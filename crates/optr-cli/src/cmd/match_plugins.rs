use crate::cmd::read_plan;
use crate::output::print_json;
use anyhow::bail;
use optr_core::marketplace;
use std::path::Path;

/// Output is always JSON — the command exists for other tooling to consume.
pub fn run(root: &Path, plan_file: Option<&Path>, threshold: f64) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        bail!("--threshold must be between 0 and 1");
    }

    let plan = read_plan(root, plan_file)?;
    let plugins = marketplace::available_plugins();
    let matches = marketplace::match_plugins(&plan, plugins, threshold);

    print_json(&matches)
}
