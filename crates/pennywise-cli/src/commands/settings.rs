//! Configuration command implementation

use std::path::Path;

use anyhow::Result;
use pennywise_core::{config::default_config_path, CategoryGroup, GroupPolicy};

use super::load_config;

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let (config, source) = load_config(config_path)?;

    println!();
    println!("⚙️  Pennywise Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);
    if let Some(path) = default_config_path() {
        println!("   Override path: {}", path.display());
    }

    println!();
    println!("   Taxonomy");
    for group in [CategoryGroup::Necessary, CategoryGroup::Unnecessary] {
        println!(
            "     {:12} {}",
            group.as_str(),
            config.taxonomy.categories_in(group).join(", ")
        );
    }
    println!("     {:12} (anything else)", CategoryGroup::Other.as_str());

    let eval = &config.evaluator;
    println!();
    println!("   Evaluator");
    println!(
        "     Unnecessary share ≤ {:.0}%   Savings ≥ {:.0}%   Top category ≤ {:.0}%",
        eval.unnecessary_max_ratio * 100.0,
        eval.savings_min_ratio * 100.0,
        eval.top_category_max_ratio * 100.0
    );

    let fc = &config.forecaster;
    println!();
    println!("   Forecaster");
    println!(
        "     Min months: {}   Trees: {}   Seed: {}   z: {}",
        fc.min_months, fc.n_trees, fc.seed, fc.confidence_z
    );
    println!(
        "     Strong change: {:.0}%   Mild change: {:.0}%",
        fc.strong_change * 100.0,
        fc.mild_change * 100.0
    );

    let alloc = &config.allocator;
    println!();
    println!("   Allocator");
    println!(
        "     Objective: {}   Smoothing: {:.2}",
        alloc.objective, alloc.smoothing
    );
    let print_policy = |name: &str, policy: &GroupPolicy| {
        println!(
            "     {:12} weight {:>4.1}   floor {:>3.0}%",
            name,
            policy.weight,
            policy.lower * 100.0
        );
    };
    print_policy("Necessary", &alloc.necessary);
    print_policy("Other", &alloc.other);
    print_policy("Unnecessary", &alloc.unnecessary);
    print_policy("(fallback)", &alloc.fallback);
    println!();

    Ok(())
}
