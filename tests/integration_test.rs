use crossplane_gen::{default_registry, Runtime};
use std::path::Path;
use tempfile::TempDir;

fn crd(name: &str, kind: &str, plural: &str, versions: &str) -> String {
    format!(
        r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: {name}
spec:
  group: example.org
  names:
    kind: {kind}
    plural: {plural}
  scope: Namespaced
  versions:
{versions}"#
    )
}

async fn run(tokens: &[String]) -> anyhow::Result<bool> {
    let registry = default_registry()?;
    let runtime = Runtime::from_options(&registry, tokens)?;
    runtime.run().await
}

fn tokens(apis: &Path, out: &Path, extra: &[&str]) -> Vec<String> {
    let mut tokens = vec![
        "xrd".to_string(),
        format!("paths={}/...", apis.display()),
        format!("output:dir={}", out.display()),
    ];
    tokens.extend(extra.iter().map(|token| token.to_string()));
    tokens
}

#[tokio::test]
async fn test_single_storage_version() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(apis.join("v1")).unwrap();
    std::fs::write(
        apis.join("v1/widgets.yaml"),
        crd(
            "widgets.example.org",
            "Widget",
            "widgets",
            "    - name: v1\n      served: true\n      storage: true\n",
        ),
    )
    .unwrap();

    let had_errors = run(&tokens(&apis, &out, &[])).await.unwrap();

    assert!(!had_errors);
    let written = std::fs::read_to_string(out.join("example.org_widgets.yaml")).unwrap();
    assert_eq!(
        written,
        "---
apiVersion: apiextensions.crossplane.io/v2
kind: CompositeResourceDefinition
metadata:
  name: widgets.example.org
spec:
  group: example.org
  names:
    kind: Widget
    plural: widgets
  versions:
  - name: v1
    referenceable: true
    served: true
"
    );
}

#[tokio::test]
async fn test_referenceable_follows_storage() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("widgets.yaml"),
        crd(
            "widgets.example.org",
            "Widget",
            "widgets",
            "    - name: v1alpha1\n      served: true\n      storage: false\n      deprecated: true\n      deprecationWarning: use v1\n    - name: v1\n      served: true\n      storage: true\n",
        ),
    )
    .unwrap();

    assert!(!run(&tokens(&apis, &out, &[])).await.unwrap());

    let written = std::fs::read_to_string(out.join("example.org_widgets.yaml")).unwrap();
    let document: serde_yaml::Value =
        serde_yaml::from_str(written.trim_start_matches("---\n")).unwrap();
    let versions = document["spec"]["versions"].as_sequence().unwrap();

    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["name"].as_str(), Some("v1alpha1"));
    assert_eq!(versions[0]["referenceable"].as_bool(), Some(false));
    assert_eq!(versions[0]["deprecated"].as_bool(), Some(true));
    assert_eq!(versions[0]["deprecationWarning"].as_str(), Some("use v1"));
    assert_eq!(versions[1]["name"].as_str(), Some("v1"));
    assert_eq!(versions[1]["referenceable"].as_bool(), Some(true));
    assert!(versions[1].get("deprecated").is_none());
    assert!(document.get("status").is_none());
}

#[tokio::test]
async fn test_missing_storage_version_fails_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("widgets.yaml"),
        crd(
            "widgets.example.org",
            "Widget",
            "widgets",
            "    - name: v1\n      served: true\n      storage: false\n",
        ),
    )
    .unwrap();

    let had_errors = run(&tokens(&apis, &out, &[])).await.unwrap();

    assert!(had_errors);
    assert!(!out.join("example.org_widgets.yaml").exists());
}

#[tokio::test]
async fn test_one_file_per_kind_with_header() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    let header = temp_dir.path().join("boilerplate.txt");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(&header, "# Copyright YEAR The Authors.\n").unwrap();
    std::fs::write(
        apis.join("all.yaml"),
        format!(
            "{}\n---\n{}",
            crd(
                "widgets.example.org",
                "Widget",
                "widgets",
                "    - name: v1\n      served: true\n      storage: true\n",
            ),
            crd(
                "gadgets.example.org",
                "Gadget",
                "gadgets",
                "    - name: v1\n      served: true\n      storage: true\n",
            ),
        ),
    )
    .unwrap();

    let header_token = format!("xrd:headerFile={},year=2025", header.display());
    let had_errors = run(&tokens(&apis, &out, &[header_token.as_str()]))
        .await
        .unwrap();

    assert!(!had_errors);
    for file in ["example.org_widgets.yaml", "example.org_gadgets.yaml"] {
        let written = std::fs::read_to_string(out.join(file)).unwrap();
        assert!(
            written.starts_with("# Copyright 2025 The Authors.\n---\n"),
            "unexpected header in {}",
            file
        );
    }
}

#[tokio::test]
async fn test_dangerous_types_need_opt_in() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("widgets.yaml"),
        crd(
            "widgets.example.org",
            "Widget",
            "widgets",
            "    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            ratio:
              type: number
",
        ),
    )
    .unwrap();

    assert!(run(&tokens(&apis, &out, &[])).await.unwrap());
    assert!(!out.join("example.org_widgets.yaml").exists());

    assert!(!run(&tokens(&apis, &out, &["xrd:allowDangerousTypes"]))
        .await
        .unwrap());
    assert!(out.join("example.org_widgets.yaml").exists());
}

#[tokio::test]
async fn test_output_none_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("widgets.yaml"),
        crd(
            "widgets.example.org",
            "Widget",
            "widgets",
            "    - name: v1\n      served: true\n      storage: true\n",
        ),
    )
    .unwrap();

    let had_errors = run(&tokens(&apis, &out, &["output:xrd:none"]))
        .await
        .unwrap();

    assert!(!had_errors);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_unrelated_documents_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("configmap.yaml"),
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n",
    )
    .unwrap();

    let had_errors = run(&tokens(&apis, &out, &[])).await.unwrap();

    assert!(!had_errors);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_earlier_kinds_stay_written_when_a_later_kind_fails() {
    let temp_dir = TempDir::new().unwrap();
    let apis = temp_dir.path().join("apis");
    let out = temp_dir.path().join("out");
    std::fs::create_dir_all(&apis).unwrap();
    std::fs::write(
        apis.join("all.yaml"),
        format!(
            "{}\n---\n{}",
            crd(
                "widgets.example.org",
                "Widget",
                "widgets",
                "    - name: v1\n      served: true\n      storage: true\n",
            ),
            crd(
                "gadgets.example.org",
                "Gadget",
                "gadgets",
                "    - name: v1\n      served: true\n      storage: false\n",
            ),
        ),
    )
    .unwrap();

    let had_errors = run(&tokens(&apis, &out, &[])).await.unwrap();

    assert!(had_errors);
    assert!(out.join("example.org_widgets.yaml").exists());
    assert!(!out.join("example.org_gadgets.yaml").exists());
}
