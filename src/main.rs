use chrono::{Datelike, Local, NaiveDate};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use color_eyre::Result;
use std::sync::Arc;

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    ai::ChatScheduleGenerator,
    api::{HttpPlannerRepository, PlannerClient},
    cache::MokaCacheAdapter,
    config::FileConfigStore,
    memory::InMemoryPlannerRepository,
    svg::render_dial,
    tui::{run_tui, App},
};
use application::{AppError, AppResult, PlannerService, StateManager, TaskEdit};
use domain::{time::parse_task_date, ContentIdeaType, TaskDraft, TaskId};
use ports::{ConfigStore, PlannerRepository, Secret};

fn cli() -> Command {
    let date_arg = |name: &'static str| {
        Arg::new(name)
            .long(name)
            .value_name("YYYY-MM-DD")
            .help("Calendar date (defaults to today)")
    };

    Command::new("famcal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A family and content planning calendar")
        .long_about("Plan projects and tasks on a month grid and a 12-hour radial day dial.\n\nWithout a subcommand the terminal UI starts.")
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .help("Planner API token (can also be set via FAMCAL_TOKEN env var)")
                .global(true),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("Planner API base URL, remembered in config.json")
                .global(true),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Use an empty in-memory store instead of the API")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("projects")
                .about("Project operations")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List projects as JSON"))
                .subcommand(
                    Command::new("add")
                        .about("Create a project")
                        .arg(Arg::new("name").required(true).index(1))
                        .arg(
                            Arg::new("color")
                                .long("color")
                                .value_name("HEX")
                                .default_value("#3b82f6"),
                        )
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a project and its tasks")
                        .arg(Arg::new("project_id").required(true).index(1)),
                )
                .subcommand(Command::new("progress").about("Completion score per project")),
        )
        .subcommand(
            Command::new("tasks")
                .about("Task operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List tasks as JSON")
                        .arg(date_arg("date").help("Only tasks on this date")),
                )
                .subcommand(
                    Command::new("add")
                        .about("Create a task")
                        .arg(Arg::new("project").long("project").required(true))
                        .arg(Arg::new("title").long("title").required(true))
                        .arg(date_arg("date"))
                        .arg(Arg::new("start").long("start").value_name("HH:mm").required(true))
                        .arg(Arg::new("end").long("end").value_name("HH:mm").required(true))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("check")
                                .long("check")
                                .value_name("TEXT")
                                .help("Checklist item, repeatable")
                                .action(ArgAction::Append),
                        )
                        .arg(
                            Arg::new("idea")
                                .long("idea")
                                .value_name("TYPE:TEXT")
                                .help("Content idea (video, story or image), repeatable")
                                .action(ArgAction::Append),
                        ),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change fields of a task")
                        .arg(Arg::new("task_id").required(true).index(1))
                        .arg(Arg::new("project").long("project"))
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("date").long("date").value_name("YYYY-MM-DD"))
                        .arg(Arg::new("start").long("start").value_name("HH:mm"))
                        .arg(Arg::new("end").long("end").value_name("HH:mm"))
                        .arg(
                            Arg::new("description")
                                .long("description")
                                .help("New description, empty to clear"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a task")
                        .arg(Arg::new("task_id").required(true).index(1)),
                )
                .subcommand(
                    Command::new("move")
                        .about("Move a task to another day")
                        .arg(Arg::new("task_id").required(true).index(1))
                        .arg(Arg::new("date").required(true).index(2)),
                )
                .subcommand(
                    Command::new("done")
                        .about("Toggle a task's completed flag")
                        .arg(Arg::new("task_id").required(true).index(1)),
                )
                .subcommand(
                    Command::new("check")
                        .about("Toggle a checklist item")
                        .arg(Arg::new("task_id").required(true).index(1))
                        .arg(Arg::new("item_id").required(true).index(2)),
                ),
        )
        .subcommand(
            Command::new("month")
                .about("Month grid as JSON")
                .arg(Arg::new("year").long("year").value_parser(value_parser!(i32)))
                .arg(
                    Arg::new("month")
                        .long("month")
                        .value_parser(value_parser!(u32).range(1..=12)),
                ),
        )
        .subcommand(
            Command::new("day")
                .about("Radial day layout as JSON or SVG")
                .arg(date_arg("date"))
                .arg(
                    Arg::new("svg")
                        .long("svg")
                        .help("Print an SVG document instead of JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate tasks from a natural-language request")
                .arg(Arg::new("prompt").long("prompt").required(true))
                .arg(Arg::new("year").long("year").value_parser(value_parser!(i32))),
        )
}

fn date_or_today(matches: &ArgMatches, name: &str) -> AppResult<NaiveDate> {
    match matches.get_one::<String>(name) {
        Some(raw) => Ok(parse_task_date(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_idea(raw: &str) -> AppResult<(ContentIdeaType, String)> {
    let (kind, text) = raw
        .split_once(':')
        .ok_or_else(|| AppError::Application(format!("Expected TYPE:TEXT, got {raw:?}")))?;
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "video" => ContentIdeaType::Video,
        "story" => ContentIdeaType::Story,
        "image" => ContentIdeaType::Image,
        other => {
            return Err(AppError::Application(format!(
                "Unknown content idea type {other:?}"
            )))
        }
    };
    Ok((kind, text.trim().to_string()))
}

fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Application(e.to_string()))?;
    println!("{json}");
    Ok(())
}

async fn run_command(state: &StateManager, matches: &ArgMatches) -> AppResult<()> {
    let planner = state.planner();
    let now = Local::now().naive_local();

    match matches.subcommand() {
        Some(("projects", projects)) => {
            planner.load(true).await;
            match projects.subcommand() {
                Some(("list", _)) => print_json(&planner.projects())?,
                Some(("add", add)) => {
                    let name = add.get_one::<String>("name").cloned().unwrap_or_default();
                    let color = add.get_one::<String>("color").cloned().unwrap_or_default();
                    let description = add.get_one::<String>("description").cloned();
                    let project = planner.create_project(&name, &color, description).await?;
                    print_json(&project)?;
                }
                Some(("rm", rm)) => {
                    let id = rm.get_one::<String>("project_id").cloned().unwrap_or_default();
                    planner.delete_project(&id.into()).await?;
                }
                Some(("progress", _)) => print_json(&planner.project_progress())?,
                _ => return Err(AppError::Application("Unknown projects subcommand".to_string())),
            }
        }
        Some(("tasks", tasks)) => {
            planner.load(true).await;
            let task_id = |m: &ArgMatches| -> TaskId {
                m.get_one::<String>("task_id")
                    .map(|s| s.as_str().into())
                    .unwrap_or_else(|| "".into())
            };
            match tasks.subcommand() {
                Some(("list", list)) => match list.get_one::<String>("date") {
                    Some(raw) => print_json(&planner.tasks_on(parse_task_date(raw)?))?,
                    None => print_json(&planner.tasks())?,
                },
                Some(("add", add)) => {
                    let value = |name: &str| add.get_one::<String>(name).cloned().unwrap_or_default();
                    let content_ideas = add
                        .get_many::<String>("idea")
                        .into_iter()
                        .flatten()
                        .map(|raw| parse_idea(raw))
                        .collect::<AppResult<Vec<_>>>()?;
                    let draft = TaskDraft {
                        project_id: value("project"),
                        title: value("title"),
                        date: date_or_today(add, "date")?.to_string(),
                        start_time: value("start"),
                        end_time: value("end"),
                        description: add.get_one::<String>("description").cloned(),
                        checklist: add
                            .get_many::<String>("check")
                            .into_iter()
                            .flatten()
                            .cloned()
                            .collect(),
                        content_ideas,
                    };
                    if planner.project(&draft.project_id.as_str().into()).is_none() {
                        return Err(AppError::NotFound(format!("project {}", draft.project_id)));
                    }
                    print_json(&planner.create_task(draft)?)?;
                }
                Some(("edit", edit)) => {
                    let value = |name: &str| edit.get_one::<String>(name).cloned();
                    let changes = TaskEdit {
                        title: value("title"),
                        project_id: value("project").map(Into::into),
                        date: value("date"),
                        start_time: value("start"),
                        end_time: value("end"),
                        description: value("description")
                            .map(|d| Some(d).filter(|d| !d.trim().is_empty())),
                        ..TaskEdit::default()
                    };
                    print_json(&planner.edit_task(&task_id(edit), &changes)?)?;
                }
                Some(("rm", rm)) => planner.delete_task(&task_id(rm))?,
                Some(("move", mv)) => {
                    let raw = mv.get_one::<String>("date").cloned().unwrap_or_default();
                    let date = parse_task_date(&raw)?;
                    match planner.move_task(&task_id(mv), date)? {
                        Some(task) => print_json(&task)?,
                        None => eprintln!("Task is already on {date}"),
                    }
                }
                Some(("done", done)) => print_json(&planner.toggle_completed(&task_id(done))?)?,
                Some(("check", check)) => {
                    let item = check.get_one::<String>("item_id").cloned().unwrap_or_default();
                    print_json(&planner.toggle_checklist_item(&task_id(check), &item.into())?)?;
                }
                _ => return Err(AppError::Application("Unknown tasks subcommand".to_string())),
            }
        }
        Some(("month", month)) => {
            planner.load(true).await;
            let today = now.date();
            let year = month.get_one::<i32>("year").copied().unwrap_or(today.year());
            let month = month.get_one::<u32>("month").copied().unwrap_or(today.month());
            state.set_visible_month(year, month);
            print_json(&state.month_view(now)?)?;
        }
        Some(("day", day)) => {
            planner.load(true).await;
            let date = date_or_today(day, "date")?;
            let selection = state.open(date, now);
            let layout = state.day_view(date, now);
            if day.get_flag("svg") {
                print!("{}", render_dial(&layout, &planner.tasks_on(date), selection.as_ref()));
            } else {
                print_json(&layout)?;
            }
        }
        Some(("generate", generate)) => {
            planner.load(true).await;
            let prompt = generate.get_one::<String>("prompt").cloned().unwrap_or_default();
            let year = generate.get_one::<i32>("year").copied().unwrap_or(now.year());
            let created = planner.generate_schedule(&prompt, year).await?;
            print_json(&created)?;
        }
        _ => return Err(AppError::Application("Unknown command".to_string())),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // The TUI owns the terminal, so logs go to a file.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("famcal.log")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let matches = cli().get_matches();

    let config_store = Arc::new(FileConfigStore::new()?);
    let mut config = config_store.load_config().await?;
    tracing::debug!("Loaded config from {}", config_store.config_path().display());

    if let Some(token) = matches.get_one::<String>("token") {
        config.api_token = Some(token.clone());
        config_store.set_secret(Secret::ApiToken, token).await?;
    }
    if let Some(url) = matches.get_one::<String>("api-url") {
        config.api_base_url = url.clone();
        config_store.save_config(&config).await?;
    }

    let repository: Arc<dyn PlannerRepository> = if matches.get_flag("offline") {
        tracing::info!("Running offline with an in-memory store");
        Arc::new(InMemoryPlannerRepository::new())
    } else {
        let client = PlannerClient::new(config.api_base_url.clone(), config.api_token.clone())?;
        tracing::info!("Using planner API at {}", client.base_url());
        Arc::new(HttpPlannerRepository::new(client))
    };

    let project_cache = Arc::new(MokaCacheAdapter::new(config.cache_ttl_seconds, 16));
    let mut planner = PlannerService::new(repository, project_cache);
    if let Some(key) = &config.ai_api_key {
        let generator = ChatScheduleGenerator::new(
            key.clone(),
            config.ai_base_url.clone(),
            config.ai_model.clone(),
        )?;
        planner = planner.with_generator(Arc::new(generator));
    }
    let planner = Arc::new(planner);

    let state_manager = Arc::new(StateManager::new(
        planner.clone(),
        config.dial,
        Local::now().date_naive(),
    ));

    if matches.subcommand().is_none() {
        let app = App::new(state_manager);
        let result = run_tui(app).await;
        planner.flush().await;
        if let Err(e) = result {
            eprintln!("❌ Application error: {e}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let result = run_command(&state_manager, &matches).await;
    planner.flush().await;
    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_task_add_collects_repeated_items() {
        let matches = cli()
            .try_get_matches_from([
                "famcal", "tasks", "add", "--project", "p", "--title", "Bake", "--start", "09:00",
                "--end", "10:00", "--check", "Flour", "--check", "Eggs", "--idea", "video:Mixing",
            ])
            .unwrap();
        let (_, tasks) = matches.subcommand().unwrap();
        let (_, add) = tasks.subcommand().unwrap();
        let checks: Vec<&String> = add.get_many::<String>("check").unwrap().collect();
        assert_eq!(checks, ["Flour", "Eggs"]);
    }

    #[test]
    fn test_month_rejects_out_of_range() {
        assert!(cli()
            .try_get_matches_from(["famcal", "month", "--month", "13"])
            .is_err());
    }

    #[test]
    fn test_parse_idea() {
        assert_eq!(
            parse_idea("Story: Behind the scenes").unwrap(),
            (ContentIdeaType::Story, "Behind the scenes".to_string())
        );
        assert!(parse_idea("podcast:Talk").is_err());
        assert!(parse_idea("no separator").is_err());
    }
}
