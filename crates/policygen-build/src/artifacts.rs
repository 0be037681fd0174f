//! Companion files written next to a successful build.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{BuildError, BuildResult};
use crate::result::EmitResult;

/// Target framework of the generated consumer project.
const TARGET_FRAMEWORK: &str = "net8.0-windows";

/// Assembly name and output directory of a successful build.
fn require_success<'a>(
    result: &'a EmitResult,
    artifact: &'static str,
) -> BuildResult<(&'a str, &'a Path)> {
    if !result.build_succeeded {
        return Err(BuildError::BuildFailed { artifact });
    }
    let name = result
        .assembly_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| BuildError::InvalidName {
            what: "assembly name",
            reason: "cannot be blank".into(),
        })?;
    let dir = result
        .output_dir
        .as_deref()
        .ok_or_else(|| BuildError::MissingOutputDirectory(PathBuf::new()))?;
    if !dir.is_dir() {
        return Err(BuildError::MissingOutputDirectory(dir.to_path_buf()));
    }
    Ok((name, dir))
}

/// Write `<asm>.log`, one diagnostic per line.
pub async fn write_build_log(result: &EmitResult) -> BuildResult<PathBuf> {
    let (name, dir) = require_success(result, "a build log")?;
    let path = dir.join(format!("{name}.log"));
    let mut text = String::new();
    for line in &result.diagnostics {
        text.push_str(line);
        text.push('\n');
    }
    tokio::fs::write(&path, text).await?;
    tracing::debug!(path = %path.display(), "Wrote build log");
    Ok(path)
}

/// Files of a generated consumer project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdkProject {
    pub project: PathBuf,
    pub manifest: PathBuf,
    pub program: PathBuf,
    pub solution: PathBuf,
}

/// Write an SDK-style console project that references the built assembly,
/// with its manifest, entry point and a solution file.
pub async fn write_sdk_project(result: &EmitResult, project_name: &str) -> BuildResult<SdkProject> {
    let (name, dir) = require_success(result, "a project")?;
    if project_name.trim().is_empty() {
        return Err(BuildError::InvalidName {
            what: "project name",
            reason: "cannot be blank".into(),
        });
    }
    if project_name.eq_ignore_ascii_case(name) {
        return Err(BuildError::InvalidName {
            what: "project name",
            reason: format!("'{project_name}' is the assembly name"),
        });
    }

    let files = SdkProject {
        project: dir.join(format!("{project_name}.csproj")),
        manifest: dir.join("app.manifest"),
        program: dir.join("Program.cs"),
        solution: dir.join(format!("{name}.sln")),
    };
    tokio::fs::write(&files.project, project_file(name)).await?;
    tokio::fs::write(&files.manifest, manifest_file(project_name)).await?;
    tokio::fs::write(&files.program, PROGRAM_FILE).await?;
    tokio::fs::write(
        &files.solution,
        solution_file(project_name, Uuid::new_v4(), Uuid::new_v4()),
    )
    .await?;

    tracing::debug!(project = %files.project.display(), "Wrote SDK project");
    Ok(files)
}

/// Write a LINQPad statements script referencing the built assembly.
pub async fn write_linqpad_script(result: &EmitResult, file_name: &str) -> BuildResult<PathBuf> {
    let (name, dir) = require_success(result, "a LINQPad script")?;
    if file_name.trim().is_empty() {
        return Err(BuildError::InvalidName {
            what: "script file name",
            reason: "cannot be blank".into(),
        });
    }
    let path = dir.join(file_name);
    tokio::fs::write(&path, linqpad_script(name)).await?;
    tracing::debug!(path = %path.display(), "Wrote LINQPad script");
    Ok(path)
}

// ── File bodies ────────────────────────────────────────────────────────

fn project_file(assembly: &str) -> String {
    format!(
        r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFramework>{TARGET_FRAMEWORK}</TargetFramework>
    <ApplicationManifest>app.manifest</ApplicationManifest>
  </PropertyGroup>
  <ItemGroup>
    <Compile Remove="*.cs" />
    <Compile Include="Program.cs" />
  </ItemGroup>
  <ItemGroup>
    <None Remove="{assembly}.dll" />
    <None Remove="{assembly}.linq" />
    <None Remove="{assembly}.pdb" />
    <None Remove="{assembly}.xml" />
    <None Remove="{assembly}.log" />
  </ItemGroup>
  <ItemGroup>
    <Reference Include="{assembly}">
      <HintPath>{assembly}.dll</HintPath>
    </Reference>
  </ItemGroup>
</Project>
"#
    )
}

fn manifest_file(project: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<assembly manifestVersion="1.0" xmlns="urn:schemas-microsoft-com:asm.v1">
  <assemblyIdentity version="1.0.0.0" name="{project}.app"/>
  <trustInfo xmlns="urn:schemas-microsoft-com:asm.v2">
    <security>
      <requestedPrivileges xmlns="urn:schemas-microsoft-com:asm.v3">
        <requestedExecutionLevel level="highestAvailable" uiAccess="false" />
      </requestedPrivileges>
    </security>
  </trustInfo>
  <compatibility xmlns="urn:schemas-microsoft-com:compatibility.v1">
    <application>
      <supportedOS Id="{{8e0f7a12-bfb3-4fe8-b9a5-48fd50a15a9a}}" />
    </application>
  </compatibility>
</assembly>
"#
    )
}

const PROGRAM_FILE: &str = r#"using System;

internal static class Program
{
    [STAThread]
    private static void Main()
    {
    }
}
"#;

fn solution_file(project: &str, project_type: Uuid, project_id: Uuid) -> String {
    let type_id = project_type.as_hyphenated().to_string().to_uppercase();
    let id = project_id.as_hyphenated().to_string().to_uppercase();
    format!(
        "\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n\
# Visual Studio Version 17\r\n\
VisualStudioVersion = 17.10.35004.147\r\n\
MinimumVisualStudioVersion = 10.0.40219.1\r\n\
Project(\"{{{type_id}}}\") = \"{project}\", \"{project}.csproj\", \"{{{id}}}\"\r\n\
EndProject\r\n\
Global\r\n\
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n\
\t\tDebug|Any CPU = Debug|Any CPU\r\n\
\t\tRelease|Any CPU = Release|Any CPU\r\n\
\tEndGlobalSection\r\n\
\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\r\n\
\t\t{{{id}}}.Debug|Any CPU.ActiveCfg = Debug|Any CPU\r\n\
\t\t{{{id}}}.Debug|Any CPU.Build.0 = Debug|Any CPU\r\n\
\t\t{{{id}}}.Release|Any CPU.ActiveCfg = Release|Any CPU\r\n\
\t\t{{{id}}}.Release|Any CPU.Build.0 = Release|Any CPU\r\n\
\tEndGlobalSection\r\n\
\tGlobalSection(SolutionProperties) = preSolution\r\n\
\t\tHideSolutionNode = FALSE\r\n\
\tEndGlobalSection\r\n\
EndGlobal\r\n"
    )
}

fn linqpad_script(assembly: &str) -> String {
    format!(
        r#"<Query Kind="Statements">
  <Reference Relative="{assembly}.dll">{assembly}.dll</Reference>
</Query>

"#
    )
}
