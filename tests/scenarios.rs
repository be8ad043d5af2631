use std::fs;
use std::path::Path;

use slnplan_rs::sln::SolutionDocument;
use slnplan_rs::{AnalyzerBuilder, ConfigKey, OutputKind, PlanError, Strategy};

const IOS_ID: &str = "{6B2F3A11-7C4E-4D2B-9A55-1E0C2B7D8F01}";
const DROID_ID: &str = "{9E8D7C6B-2222-4B4B-9C9C-000000000003}";
const CSHARP: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

fn ios_csproj(archs: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{IOS_ID}</ProjectGuid>
    <OutputType>Exe</OutputType>
    <AssemblyName>Shop</AssemblyName>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Release|iPhone' ">
    <OutputPath>bin\iPhone\Release</OutputPath>
    <MtouchArch>{archs}</MtouchArch>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="Xamarin.iOS" />
  </ItemGroup>
</Project>
"#
    )
}

fn droid_csproj() -> String {
    format!(
        r#"<Project>
  <PropertyGroup>
    <ProjectGuid>{DROID_ID}</ProjectGuid>
    <OutputType>Exe</OutputType>
    <AssemblyName>ShopDroid</AssemblyName>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ">
    <OutputPath>bin\Release</OutputPath>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="Mono.Android" />
  </ItemGroup>
</Project>
"#
    )
}

fn project_line(name: &str, path: &str, id: &str) -> String {
    format!("Project(\"{CSHARP}\") = \"{name}\", \"{path}\", \"{id}\"\nEndProject\n")
}

fn global(mappings: &[String]) -> String {
    let mut s = String::from(
        "Global\n\
         \tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n\
         \t\tDebug|iPhone = Debug|iPhone\n\
         \t\tRelease|iPhone = Release|iPhone\n\
         \tEndGlobalSection\n\
         \tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n",
    );
    for m in mappings {
        s.push_str("\t\t");
        s.push_str(m);
        s.push('\n');
    }
    s.push_str("\tEndGlobalSection\nEndGlobal\n");
    s
}

/// Writes `Shop.sln` with an iOS project (P1) and an Android project (P2).
fn write_tree(root: &Path, archs: &str, extra_references: &str) -> std::path::PathBuf {
    fs::create_dir_all(root.join("Shop.iOS")).unwrap();
    fs::create_dir_all(root.join("Shop.Droid")).unwrap();
    fs::write(root.join("Shop.iOS/Shop.iOS.csproj"), ios_csproj(archs)).unwrap();
    fs::write(root.join("Shop.Droid/Shop.Droid.csproj"), droid_csproj()).unwrap();

    let sln = format!(
        "{}{}{}{}",
        project_line("Shop.iOS", "Shop.iOS\\Shop.iOS.csproj", IOS_ID),
        project_line("Shop.Droid", "Shop.Droid\\Shop.Droid.csproj", DROID_ID),
        extra_references,
        global(&[
            format!("{IOS_ID}.Release|iPhone.ActiveCfg = Release|iPhone"),
            format!("{IOS_ID}.Release|iPhone.Build.0 = Release|iPhone"),
            format!("{DROID_ID}.Release|iPhone.ActiveCfg = Release|Any CPU"),
        ]),
    );
    let path = root.join("Shop.sln");
    fs::write(&path, sln).unwrap();
    path
}

#[test]
fn scenario_a_all_arm_architectures_archive() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "armv7, arm64", "");

    let analyzer = AnalyzerBuilder::new().tool_path("mdtool").from_file(&sln).unwrap();
    let resolution = analyzer.resolve("Release", "iPhone").unwrap().unwrap();

    assert_eq!(resolution.project.name, "Shop.iOS");
    assert_eq!(resolution.strategy, Strategy::Archive);
    assert_eq!(
        resolution.invocation.args,
        [
            "archive".to_string(),
            "-c:Release|iPhone".to_string(),
            sln.display().to_string(),
            "-p:Shop.iOS".to_string(),
        ]
    );
}

#[test]
fn scenario_b_simulator_architecture_builds() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "i386", "");

    let analyzer = AnalyzerBuilder::new().from_file(&sln).unwrap();
    let resolution = analyzer.resolve("Release", "iPhone").unwrap().unwrap();
    assert_eq!(resolution.strategy, Strategy::Build);
    assert_eq!(resolution.invocation.args[0], "build");
}

#[test]
fn scenario_c_missing_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "arm64", "");

    let analyzer = AnalyzerBuilder::new().from_file(&sln).unwrap();
    let err = analyzer.resolve("Debug", "iPhone").unwrap_err();
    match &err {
        PlanError::MissingMapping { configuration, project } => {
            assert_eq!(configuration, "Debug|iPhone");
            assert_eq!(project, "Shop.iOS");
        }
        other => panic!("expected MissingMapping, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("Debug|iPhone") && message.contains("Shop.iOS"));

    // The model is still usable for another configuration.
    assert!(analyzer.resolve("Release", "iPhone").unwrap().is_some());
}

#[test]
fn scenario_d_missing_project_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let ghost = project_line(
        "Shop.Watch",
        "Shop.Watch\\Shop.Watch.csproj",
        "{00000000-0000-0000-0000-0000000000FF}",
    );
    let sln = write_tree(dir.path(), "arm64", &ghost);

    let analyzer = AnalyzerBuilder::new().from_file(&sln).unwrap();
    let solution = analyzer.solution();
    let names: Vec<&str> = solution.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Shop.iOS", "Shop.Droid"]);
    assert_eq!(solution.skipped.len(), 1);
    assert_eq!(solution.skipped[0].name, "Shop.Watch");
}

#[test]
fn project_count_matches_existing_references() {
    let dir = tempfile::tempdir().unwrap();
    let ghosts = format!(
        "{}{}",
        project_line("A", "A\\A.csproj", "{A}"),
        project_line("B", "B\\B.csproj", "{B}")
    );
    let sln = write_tree(dir.path(), "arm64", &ghosts);

    let source = fs::read_to_string(&sln).unwrap();
    let raw = SolutionDocument::parse(&source).references.len();
    let solution = slnplan_rs::sln::parse_solution(&sln).unwrap();
    assert_eq!(raw, 4);
    assert_eq!(solution.projects.len(), 2);
    assert_eq!(solution.projects.len() + solution.skipped.len(), raw);
}

#[test]
fn reparsing_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "armv7, arm64", "");

    let first = AnalyzerBuilder::new().from_file(&sln).unwrap();
    let second = AnalyzerBuilder::new().from_file(&sln).unwrap();
    assert_eq!(first.solution(), second.solution());
}

#[test]
fn mappings_before_projects_still_attach() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "arm64", "");
    let source = fs::read_to_string(&sln).unwrap();

    // Move the Global block in front of the project references.
    let (projects, globals) = source.split_at(source.find("Global\n").unwrap());
    let reordered = dir.path().join("Reordered.sln");
    fs::write(&reordered, format!("{globals}{projects}")).unwrap();

    let solution = slnplan_rs::sln::parse_solution(&reordered).unwrap();
    let ios = solution.project_by_name("Shop.iOS").unwrap();
    assert_eq!(
        ios.local_configuration(&ConfigKey::new("Release", "iPhone")),
        Some(&ConfigKey::new("Release", "iPhone"))
    );
}

#[test]
fn id_mismatch_aborts_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let sln = write_tree(dir.path(), "arm64", "");
    let source = fs::read_to_string(&sln).unwrap();
    fs::write(&sln, source.replace(DROID_ID, "{DEADBEEF-0000-0000-0000-000000000000}")).unwrap();

    let err = AnalyzerBuilder::new().from_file(&sln).unwrap_err();
    match err {
        PlanError::ProjectIdMismatch { path, .. } => {
            assert!(path.ends_with("Shop.Droid/Shop.Droid.csproj"));
        }
        other => panic!("expected ProjectIdMismatch, got {other:?}"),
    }
}

#[test]
fn android_only_solution_falls_back_to_whole_solution() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Shop.Droid")).unwrap();
    fs::write(dir.path().join("Shop.Droid/Shop.Droid.csproj"), droid_csproj()).unwrap();
    let sln = dir.path().join("Droid.sln");
    fs::write(
        &sln,
        format!(
            "{}{}",
            project_line("Shop.Droid", "Shop.Droid\\Shop.Droid.csproj", DROID_ID),
            global(&[format!("{DROID_ID}.Release|iPhone.ActiveCfg = Release|Any CPU")])
        ),
    )
    .unwrap();

    let analyzer = AnalyzerBuilder::new().tool_path("mdtool").from_file(&sln).unwrap();
    assert!(analyzer.resolve("Release", "iPhone").unwrap().is_none());

    let invocation = analyzer.build_command("Release", "iPhone").unwrap();
    assert_eq!(invocation.program, "mdtool");
    assert_eq!(invocation.args.len(), 3);
    assert_eq!(invocation.args[0], "build");
}

#[test]
fn output_table_for_build_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archives = dir.path().join("Archives");

    // Build: the .app lands in the project's output directory.
    let sln = write_tree(dir.path(), "i386", "");
    fs::create_dir_all(dir.path().join("Shop.iOS/bin/iPhone/Release/Shop.app")).unwrap();
    let analyzer = AnalyzerBuilder::new()
        .archive_root(&archives)
        .from_file(&sln)
        .unwrap();
    let table = analyzer.output_table("Release", "iPhone").unwrap();
    let app = table[&OutputKind::App].as_ref().unwrap();
    assert!(app.ends_with("Shop.iOS/bin/iPhone/Release/Shop.app"));
    assert!(!table.contains_key(&OutputKind::Archive));

    // Archive without an archive directory is fatal.
    fs::write(dir.path().join("Shop.iOS/Shop.iOS.csproj"), ios_csproj("arm64")).unwrap();
    let analyzer = AnalyzerBuilder::new()
        .archive_root(&archives)
        .from_file(&sln)
        .unwrap();
    assert!(matches!(
        analyzer.output_table("Release", "iPhone"),
        Err(PlanError::MissingArchiveRoot(_))
    ));

    // Archive: the newest matching bundle wins.
    fs::create_dir_all(archives.join("2016-05-12/Shop 5-12-16 3.45 PM.xcarchive")).unwrap();
    fs::create_dir_all(archives.join("2016-05-12/Shop 5-12-16 11.02 AM.xcarchive")).unwrap();
    let table = analyzer.output_table("Release", "iPhone").unwrap();
    let archive = table[&OutputKind::Archive].as_ref().unwrap();
    assert!(archive.ends_with("2016-05-12/Shop 5-12-16 3.45 PM.xcarchive"));
}
