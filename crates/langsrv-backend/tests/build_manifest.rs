//! Compiler context resolution against manifests on disk.

use std::fs;
use std::path::{Path, PathBuf};

use langsrv_backend::{BuildManifestResolver, ManifestError};
use langsrv_server::{CollaboratorError, CompilerContextResolver};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const MANIFEST: &str = r#"client:
  name: swift-build
tools: {}
commands:
  "<App.module>":
    tool: swift-compiler
    sources: ["/pkg/Sources/App/main.swift", "/pkg/Sources/App/util.swift"]
    other-args: ["-Onone", "-g"]
    import-paths: ["/pkg/.build/debug", "/pkg/.build/modules"]
  "<pkg.module>":
    sources: ["/pkg/Sources/main.swift"]
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn root(&self) -> PathBuf {
        self.dir.path().join("pkg")
    }

    fn document(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }
}

#[fixture]
fn project() -> Project {
    let dir = TempDir::new().expect("temp dir");
    let build = dir.path().join("pkg").join(".build");
    fs::create_dir_all(&build).expect("build dir");
    fs::write(build.join("debug.yaml"), MANIFEST).expect("manifest written");
    Project { dir }
}

fn resolver() -> BuildManifestResolver {
    BuildManifestResolver::new(".build/debug.yaml")
}

#[rstest]
fn resolves_the_module_of_a_source_file(project: Project) {
    let context = resolver()
        .resolve(&project.root(), &project.document("Sources/App/main.swift"))
        .expect("context resolves");

    assert_eq!(context.module, "App");
    assert_eq!(
        context.arguments(),
        [
            "/pkg/Sources/App/main.swift",
            "/pkg/Sources/App/util.swift",
            "-module-name",
            "App",
            "-Onone",
            "-g",
            "-I",
            "/pkg/.build/debug",
            "-I",
            "/pkg/.build/modules",
        ]
    );
}

#[rstest]
fn files_directly_in_sources_use_the_package_name(project: Project) {
    let context = resolver()
        .resolve(&project.root(), &project.document("Sources/main.swift"))
        .expect("context resolves");

    assert_eq!(context.module, "pkg");
    assert!(context.import_paths.is_empty());
    assert!(context.extra_args.is_empty());
}

#[rstest]
fn unknown_module_is_reported(project: Project) {
    let error = resolver()
        .context_for(&project.root(), &project.document("Sources/Lib/lib.swift"))
        .expect_err("module is absent");

    assert!(
        matches!(&error, ManifestError::ModuleMissing { module, .. } if module == "Lib"),
        "{error}"
    );
}

#[rstest]
fn absolute_manifest_paths_are_used_as_is(project: Project) {
    let absolute = project.root().join(".build").join("debug.yaml");
    let resolver = BuildManifestResolver::new(
        camino::Utf8PathBuf::from_path_buf(absolute).expect("utf-8 temp path"),
    );

    let context = resolver
        .resolve(Path::new("/elsewhere/pkg"), Path::new("/elsewhere/pkg/Sources/App/a.swift"))
        .expect("context resolves");
    assert_eq!(context.module, "App");
}

#[rstest]
fn missing_manifest_makes_the_collaborator_unavailable() {
    let dir = TempDir::new().expect("temp dir");
    let error = resolver()
        .resolve(dir.path(), &dir.path().join("Sources/App/main.swift"))
        .expect_err("manifest is missing");

    assert!(matches!(error, CollaboratorError::Unavailable { .. }), "{error}");
    assert!(error.to_string().contains("cannot read"), "{error}");
}

#[rstest]
fn malformed_manifest_is_reported(project: Project) {
    fs::write(
        project.root().join(".build").join("debug.yaml"),
        "commands: [unterminated",
    )
    .expect("manifest rewritten");

    let error = resolver()
        .context_for(&project.root(), &project.document("Sources/App/main.swift"))
        .expect_err("manifest is malformed");
    assert!(matches!(error, ManifestError::Parse { .. }), "{error}");
}
