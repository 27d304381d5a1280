//! Shared settings are handed down explicitly through an [`Environment`].
//! A detail sheet gets a child environment that overrides the theme only.

use cellkit::runtime::reactive::{Observable, State, TwoWayBinding};
use cellkit::runtime::{
    Environment, Result as CellResult, Runtime, RuntimeConfig, Tracker, View,
};

use super::{Scenario, Transcript};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nickname(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    HighContrast,
}

/// Never provided; looking it up shows the missing-value error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

struct ContentView {
    settings: Observable<UserSettings>,
    nickname: Observable<Nickname>,
    theme: Observable<Theme>,
}

impl ContentView {
    fn from_env(env: &Environment) -> CellResult<Self> {
        Ok(Self {
            settings: env.require()?,
            nickname: env.require()?,
            theme: env.require()?,
        })
    }
}

impl View for ContentView {
    fn name(&self) -> &str {
        "ContentView"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.settings)?
            .watch(&self.nickname)?
            .watch(&self.theme)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!(
            "[{:?}] {}: score {}",
            self.theme.get(),
            self.nickname.get().0,
            self.settings.get().score
        ))
    }
}

/// Writes the score but shows nothing that depends on it.
struct ScoreButton {
    settings: Observable<UserSettings>,
}

impl ScoreButton {
    fn from_env(env: &Environment) -> CellResult<Self> {
        Ok(Self {
            settings: env.require()?,
        })
    }

    fn tap(&self) {
        self.settings.update(|s| s.score += 1);
    }
}

impl View for ScoreButton {
    fn name(&self) -> &str {
        "ScoreButton"
    }

    fn track(&self, _deps: &mut Tracker<'_>) -> CellResult<()> {
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok("[ Increase Score ]".to_string())
    }
}

struct DetailSheet {
    settings: Observable<UserSettings>,
    theme: Observable<Theme>,
}

impl DetailSheet {
    fn from_env(env: &Environment) -> CellResult<Self> {
        Ok(Self {
            settings: env.require()?,
            theme: env.require()?,
        })
    }
}

impl View for DetailSheet {
    fn name(&self) -> &str {
        "DetailSheet"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.settings)?.watch(&self.theme)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!(
            "[{:?}] detail: score {}",
            self.theme.get(),
            self.settings.get().score
        ))
    }
}

/// Edits a local draft kept in sync with the shared nickname.
struct NameField {
    draft: State<Nickname>,
    _sync: TwoWayBinding<Nickname>,
}

impl NameField {
    fn from_env(env: &Environment) -> CellResult<Self> {
        let nickname: Observable<Nickname> = env.require()?;
        let draft = State::new(Nickname(String::new()));
        let sync = TwoWayBinding::new(nickname, draft.link())?;
        Ok(Self { draft, _sync: sync })
    }
}

impl View for NameField {
    fn name(&self) -> &str {
        "NameField"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.draft)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("name: [{}]", self.draft.get().0))
    }
}

struct LocaleBadge {
    locale: Observable<Locale>,
}

impl View for LocaleBadge {
    fn name(&self) -> &str {
        "LocaleBadge"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.locale)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(self.locale.get().0)
    }
}

pub fn run(config: &RuntimeConfig) -> Result<Transcript> {
    let mut rt = Runtime::new(config.clone());
    let mut transcript = Transcript::new(Scenario::Settings);

    let root = Environment::new();
    let settings = root.insert(UserSettings { score: 0 });
    root.insert(Nickname("player".to_string()));
    let theme = root.insert(Theme::Light);

    let sheet_env = root.child();
    sheet_env.insert(Theme::Dark);

    let button = ScoreButton::from_env(&root)?;
    let tapper = ScoreButton {
        settings: button.settings.clone(),
    };
    let field = NameField::from_env(&root)?;
    let typing = field.draft.link();

    let ids = [
        rt.mount(ContentView::from_env(&root)?)?,
        rt.mount(button)?,
        rt.mount(DetailSheet::from_env(&sheet_env)?)?,
        rt.mount(field)?,
    ];
    for id in ids {
        transcript.mounted(&rt, id);
    }

    transcript.note("tap Increase Score twice");
    let ((), report) = rt.turn(|| {
        tapper.tap();
        tapper.tap();
    });
    transcript.record(&rt, &report);

    transcript.note("type a new name");
    let (result, report) = rt.turn(|| typing.set(Nickname("ace".to_string())));
    result?;
    transcript.record(&rt, &report);

    transcript.note("switch the root theme; the sheet keeps its override");
    let ((), report) = rt.turn(|| {
        theme.set(Theme::HighContrast);
    });
    transcript.record(&rt, &report);

    match root.require::<Locale>() {
        Ok(locale) => {
            let id = rt.mount(LocaleBadge { locale })?;
            transcript.mounted(&rt, id);
        }
        Err(err) => transcript.note(format!("LocaleBadge not mounted: {err}")),
    }
    transcript.note(format!("final score: {}", settings.get().score));

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::DRIVER;

    #[test]
    fn environment_values_are_shared() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        assert_eq!(
            transcript.bodies("ContentView"),
            [
                "[Light] player: score 0",
                "[Light] player: score 2",
                "[Light] ace: score 2",
                "[HighContrast] ace: score 2",
            ]
        );
        assert_eq!(
            transcript.bodies("DetailSheet"),
            ["[Dark] detail: score 0", "[Dark] detail: score 2"]
        );
    }

    #[test]
    fn writer_without_dependencies_never_re_renders() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        assert_eq!(transcript.bodies("ScoreButton"), ["[ Increase Score ]"]);
    }

    #[test]
    fn draft_seeds_from_and_writes_to_shared_nickname() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        assert_eq!(transcript.bodies("NameField"), ["name: [player]", "name: [ace]"]);
    }

    #[test]
    fn missing_value_is_reported() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        let notes = transcript.bodies(DRIVER);
        assert!(
            notes
                .iter()
                .any(|n| n.starts_with("LocaleBadge not mounted: no environment value of type"))
        );
        assert_eq!(notes.last().copied(), Some("final score: 2"));
    }
}
