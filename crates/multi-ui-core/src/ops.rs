//! The two operations behind the CLI subcommands
//!
//! `run_setup` and `run_add` hold all the sequencing and policy; the terminal
//! front-end only renders their outcomes. Interactive prompting and package
//! installation sit behind traits so tests drive the flows with scripted
//! fakes instead of a TTY and a real npm.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{Language, LoadedPreference, Preference, PreferenceSource, PreferenceStore};
use crate::materialize;
use crate::registry::ComponentFetcher;
use crate::transform;

/// Directory appended to the chosen target directory, so components always
/// land in a recognizable `multi-ui/components` subtree
pub const COMPONENT_SUBDIR: &str = "multi-ui/components";

/// What the setup flow asks the user
#[derive(Debug, Clone)]
pub struct SetupAnswers {
    pub language: Language,
    /// Target directory, relative to the project root (e.g. "src/app/")
    pub directory: String,
}

/// Source of interactive answers during setup
pub trait PromptProvider {
    fn setup_answers(&mut self) -> Result<SetupAnswers>;

    /// Ask whether to run the given install command
    fn confirm_install(&mut self, command: &str) -> Result<bool>;
}

/// Installs the peer packages components depend on
#[async_trait]
pub trait DependencyInstaller {
    /// Human-readable command line, shown before asking for confirmation
    fn command(&self) -> String;

    async fn install(&self) -> Result<()>;
}

#[derive(Debug)]
pub struct SetupOutcome {
    pub preference: Preference,
    pub config_path: PathBuf,
    /// Whether the peer packages were installed in this run
    pub installed: bool,
    /// Install failure, if any. The preference file is already written at
    /// that point and stays; setup is still considered successful.
    pub install_error: Option<String>,
}

#[derive(Debug)]
pub struct AddOutcome {
    pub file_path: PathBuf,
    pub language: Language,
    /// True when the source went through the TSX to JSX pipeline
    pub transformed: bool,
    /// True when no preference file existed and defaults were substituted
    pub used_default_preference: bool,
}

/// Run the setup flow: prompt for preferences, persist them, then offer to
/// install the peer packages. The preference file is written before any
/// install attempt and is never rolled back.
pub async fn run_setup<P, I>(
    project_dir: &Path,
    prompts: &mut P,
    installer: &I,
    skip_install: bool,
) -> Result<SetupOutcome>
where
    P: PromptProvider,
    I: DependencyInstaller,
{
    let answers = prompts.setup_answers()?;

    let preference = Preference {
        language: answers.language,
        component_path: Path::new(&answers.directory).join(COMPONENT_SUBDIR),
    };

    let store = PreferenceStore::new(project_dir);
    store
        .save(&preference)
        .with_context(|| "Failed to save preferences".to_string())?;

    let mut installed = false;
    let mut install_error = None;
    if !skip_install && prompts.confirm_install(&installer.command())? {
        match installer.install().await {
            Ok(()) => installed = true,
            Err(e) => install_error = Some(format!("{e:#}")),
        }
    }

    Ok(SetupOutcome {
        preference,
        config_path: store.path().to_path_buf(),
        installed,
        install_error,
    })
}

/// Run the add flow: load the preference, fetch the component, transform it
/// when the project is JavaScript, and write it into the component directory.
pub async fn run_add(
    project_dir: &Path,
    fetcher: &ComponentFetcher,
    component: &str,
) -> Result<AddOutcome> {
    let store = PreferenceStore::new(project_dir);
    let LoadedPreference { preference, source } = store.load()?;

    let fetched = fetcher.fetch(component).await?;

    let (text, transformed) = match preference.language {
        Language::TypeScript => (fetched, false),
        Language::JavaScript => {
            let virtual_filename = format!("{component}.tsx");
            let converted = transform::to_javascript(&fetched, &virtual_filename)
                .with_context(|| format!("Failed to convert '{component}' to JavaScript"))?;
            (converted, true)
        }
    };

    let component_dir = if preference.component_path.is_absolute() {
        preference.component_path.clone()
    } else {
        project_dir.join(&preference.component_path)
    };

    let file_path =
        materialize::write_component(&component_dir, component, preference.language, &text).await?;

    Ok(AddOutcome {
        file_path,
        language: preference.language,
        transformed,
        used_default_preference: source == PreferenceSource::Default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COMPONENT_PATH;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    struct ScriptedPrompts {
        answers: SetupAnswers,
        accept_install: bool,
    }

    impl PromptProvider for ScriptedPrompts {
        fn setup_answers(&mut self) -> Result<SetupAnswers> {
            Ok(self.answers.clone())
        }

        fn confirm_install(&mut self, _command: &str) -> Result<bool> {
            Ok(self.accept_install)
        }
    }

    struct FakeInstaller {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeInstaller {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl DependencyInstaller for FakeInstaller {
        fn command(&self) -> String {
            "npm install framer-motion clsx".to_string()
        }

        async fn install(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("npm exploded");
            }
            Ok(())
        }
    }

    fn fetcher_for(server: &mockito::Server) -> ComponentFetcher {
        ComponentFetcher::new(Url::parse(&server.url()).unwrap(), "multi-ui-test")
    }

    #[tokio::test]
    async fn test_setup_persists_preference_and_installs() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompts = ScriptedPrompts {
            answers: SetupAnswers {
                language: Language::JavaScript,
                directory: "src/app/".to_string(),
            },
            accept_install: true,
        };
        let installer = FakeInstaller::new(false);

        let outcome = run_setup(dir.path(), &mut prompts, &installer, false)
            .await
            .unwrap();

        assert!(outcome.installed);
        assert_eq!(installer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcome.preference.component_path,
            Path::new("src/app/").join("multi-ui/components")
        );
        let loaded = PreferenceStore::new(dir.path()).load().unwrap();
        assert_eq!(loaded.preference.language, Language::JavaScript);
    }

    #[tokio::test]
    async fn test_setup_declined_install_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompts = ScriptedPrompts {
            answers: SetupAnswers {
                language: Language::TypeScript,
                directory: "src".to_string(),
            },
            accept_install: false,
        };
        let installer = FakeInstaller::new(false);

        let outcome = run_setup(dir.path(), &mut prompts, &installer, false)
            .await
            .unwrap();

        assert!(!outcome.installed);
        assert!(outcome.install_error.is_none());
        assert_eq!(installer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_setup_install_failure_keeps_preference_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompts = ScriptedPrompts {
            answers: SetupAnswers {
                language: Language::TypeScript,
                directory: "src".to_string(),
            },
            accept_install: true,
        };
        let installer = FakeInstaller::new(true);

        let outcome = run_setup(dir.path(), &mut prompts, &installer, false)
            .await
            .unwrap();

        assert!(!outcome.installed);
        assert!(outcome.install_error.unwrap().contains("npm exploded"));
        assert!(outcome.config_path.exists());
    }

    #[tokio::test]
    async fn test_add_typescript_writes_source_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        PreferenceStore::new(dir.path())
            .save(&Preference {
                language: Language::TypeScript,
                component_path: PathBuf::from("ui"),
            })
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let body = "interface Props {}\nexport default function Button_1() {}\n";
        server
            .mock("GET", "/button/_components/Button_1.tsx")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let outcome = run_add(dir.path(), &fetcher_for(&server), "Button_1")
            .await
            .unwrap();

        assert!(!outcome.transformed);
        assert!(!outcome.used_default_preference);
        assert_eq!(outcome.file_path, dir.path().join("ui/Button_1.tsx"));
        assert_eq!(std::fs::read_to_string(&outcome.file_path).unwrap(), body);
    }

    #[tokio::test]
    async fn test_add_javascript_transforms_and_uses_jsx_extension() {
        let dir = tempfile::tempdir().unwrap();
        PreferenceStore::new(dir.path())
            .save(&Preference {
                language: Language::JavaScript,
                component_path: PathBuf::from("ui"),
            })
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/card/_components/Card_2.tsx")
            .with_status(200)
            .with_body("export default function Card_2({ title }: { title: string }) {\n  return <h2>{title}</h2>;\n}\n")
            .create_async()
            .await;

        let outcome = run_add(dir.path(), &fetcher_for(&server), "Card_2")
            .await
            .unwrap();

        assert!(outcome.transformed);
        assert_eq!(outcome.file_path, dir.path().join("ui/Card_2.jsx"));
        let written = std::fs::read_to_string(&outcome.file_path).unwrap();
        assert!(!written.contains(": string"));
        assert!(written.contains("React.createElement(\"h2\", null, title)"));
    }

    #[tokio::test]
    async fn test_add_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/button/_components/Button_1.tsx")
            .with_status(200)
            .with_body("export default function Button_1() {}\n")
            .create_async()
            .await;

        let outcome = run_add(dir.path(), &fetcher_for(&server), "Button_1")
            .await
            .unwrap();

        assert!(outcome.used_default_preference);
        assert_eq!(
            outcome.file_path,
            dir.path().join(DEFAULT_COMPONENT_PATH).join("Button_1.tsx")
        );
    }

    #[tokio::test]
    async fn test_add_missing_component_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ghost/_components/Ghost_9.tsx")
            .with_status(404)
            .create_async()
            .await;

        let err = run_add(dir.path(), &fetcher_for(&server), "Ghost_9")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("Ghost_9"));
    }

    #[tokio::test]
    async fn test_add_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path());
        std::fs::write(store.path(), "{broken").unwrap();

        let server = mockito::Server::new_async().await;
        let err = run_add(dir.path(), &fetcher_for(&server), "Button_1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed configuration"));
    }

    #[tokio::test]
    async fn test_add_overwrites_previous_copy() {
        let dir = tempfile::tempdir().unwrap();
        PreferenceStore::new(dir.path())
            .save(&Preference {
                language: Language::TypeScript,
                component_path: PathBuf::from("ui"),
            })
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/button/_components/Button_1.tsx")
            .with_status(200)
            .with_body("v2")
            .create_async()
            .await;
        std::fs::create_dir_all(dir.path().join("ui")).unwrap();
        std::fs::write(dir.path().join("ui/Button_1.tsx"), "v1").unwrap();

        let outcome = run_add(dir.path(), &fetcher_for(&server), "Button_1")
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&outcome.file_path).unwrap(), "v2");
        mock.assert_async().await;
    }
}
