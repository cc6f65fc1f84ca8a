//! Deciding which discovered classes belong to the user's application.

/// Root package of the framework whose marker annotation we look for.
pub const GRAIN_PACKAGE: &str = "com._7aske.grain";

/// Keeps user classes and drops anything under an excluded package, so
/// the framework never nominates one of its own classes as entry point.
#[derive(Debug, Clone)]
pub struct OwnershipFilter {
    framework_package: String,
    excluded: Vec<String>,
}

impl OwnershipFilter {
    pub fn new(framework_package: impl Into<String>) -> Self {
        let framework_package = framework_package.into();
        Self {
            excluded: vec![framework_package.clone()],
            framework_package,
        }
    }

    pub fn exclude(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if !package.is_empty() && !self.excluded.contains(&package) {
            self.excluded.push(package);
        }
        self
    }

    pub fn framework_package(&self) -> &str {
        &self.framework_package
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn allows(&self, class_name: &str) -> bool {
        !self
            .excluded
            .iter()
            .any(|package| in_package(class_name, package))
    }

    /// The framework's own build is never stamped with a main class.
    pub fn is_framework_project(&self, group_id: &str) -> bool {
        group_id == self.framework_package
    }
}

impl Default for OwnershipFilter {
    fn default() -> Self {
        Self::new(GRAIN_PACKAGE)
    }
}

fn in_package(class_name: &str, package: &str) -> bool {
    class_name
        .strip_prefix(package)
        .is_some_and(|rest| rest.starts_with('.'))
}
