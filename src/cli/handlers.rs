use std::io::Write;

use eyre::{Context, Result};

use super::{
    Action, ConversationAction, DataAction, NoteAction, ProjectAction, TaskAction, TemplateAction,
};
use crate::{
    backend::{OpenAI, TitleGenerator, new_backend},
    config::{Configuration, verbose},
    models::{
        AVAILABLE_MODELS, ConversationUpdate, NewConversation, NewNote, NewProject, NewTask,
        NewTemplate, NoteCategory, NoteQuery, NotesStats, TaskStats, TaskStatus, TaskUpdate,
    },
    repository::{ArcAiRepository, ArcWorkspaceRepository, new_repository, new_workspace},
    services::{
        ChatService, ChatSettings, ExportPeriod, WorkspaceExport, due_tasks, export_workspace,
        import_workspace, render_markdown,
    },
    storage::{LocalStore, new_storage},
};

pub async fn run(action: &Action, config: &Configuration) -> Result<()> {
    match action {
        Action::Conversations { action } => conversations(config, action.as_ref()).await,
        Action::Messages { conversation_id } => messages(config, conversation_id).await,
        Action::Templates { action } => templates(config, action.as_ref()).await,
        Action::Chat {
            conversation,
            template,
            model,
            message,
        } => {
            chat(
                config,
                conversation.as_deref(),
                template.as_deref(),
                model.as_deref(),
                &message.join(" "),
            )
            .await
        }
        Action::Projects { action } => projects(config, action.as_ref()).await,
        Action::Tasks { action } => tasks(config, action.as_ref()).await,
        Action::Notes { action } => notes(config, action.as_ref()).await,
        Action::Data { action } => data(config, action).await,
        Action::Stats => stats(config).await,
        Action::Models => {
            models(config);
            Ok(())
        }
        Action::CheckKey => check_key(config).await,
        Action::ResetLocal => reset_local(config).await,
    }
}

async fn ai_repository(config: &Configuration) -> Result<ArcAiRepository> {
    verbose!("[+] Initializing storage...");
    let kv = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");
    new_repository(config, kv)
}

fn workspace(config: &Configuration) -> Result<ArcWorkspaceRepository> {
    new_workspace(config).wrap_err("initializing workspace")
}

async fn conversations(config: &Configuration, action: Option<&ConversationAction>) -> Result<()> {
    let repo = ai_repository(config).await?;
    match action.unwrap_or(&ConversationAction::List) {
        ConversationAction::List => {
            for c in repo.list_conversations().await? {
                println!(
                    "{}  {}  [{}]  {}",
                    c.id(),
                    c.updated_at().format("%Y-%m-%d %H:%M"),
                    c.model_name(),
                    c.title()
                );
            }
        }
        ConversationAction::New { title, model } => {
            let mut params = NewConversation::new();
            if let Some(title) = title {
                params = params.with_title(title);
            }
            if let Some(model) = model {
                params = params.with_model_name(model);
            }
            let c = repo.create_conversation(params).await?;
            println!("{}", c.id());
        }
        ConversationAction::Rename { id, title } => {
            repo.update_conversation(id, ConversationUpdate::new().with_title(title))
                .await?;
        }
        ConversationAction::Delete { id } => repo.delete_conversation(id).await?,
    }
    Ok(())
}

async fn messages(config: &Configuration, conversation_id: &str) -> Result<()> {
    let repo = ai_repository(config).await?;
    for m in repo.list_messages(conversation_id).await? {
        println!("[{}] {}:\n{}\n", m.timestamp().format("%H:%M:%S"), m.role(), m.content());
    }
    Ok(())
}

async fn templates(config: &Configuration, action: Option<&TemplateAction>) -> Result<()> {
    let repo = ai_repository(config).await?;
    match action.unwrap_or(&TemplateAction::List) {
        TemplateAction::List => {
            for t in repo.list_templates().await? {
                let kind = if t.is_system() { "system" } else { "user" };
                println!("{}  ({})  {} - {}", t.id(), kind, t.name(), t.description());
            }
        }
        TemplateAction::Add {
            name,
            description,
            content,
        } => {
            let t = repo
                .create_template(NewTemplate::new(name, description, content))
                .await?;
            println!("{}", t.id());
        }
        TemplateAction::Delete { id } => repo.delete_template(id).await?,
    }
    Ok(())
}

async fn chat(
    config: &Configuration,
    conversation_id: Option<&str>,
    template_id: Option<&str>,
    model: Option<&str>,
    input: &str,
) -> Result<()> {
    let repo = ai_repository(config).await?;
    let backend = new_backend(&config.gateway)?;

    let conversation_id = match conversation_id {
        Some(id) => id.to_string(),
        None => {
            let mut params = NewConversation::new();
            if let Some(model) = model {
                params = params.with_model_name(model);
            }
            let created = repo.create_conversation(params).await?;
            verbose!("[+] Created conversation {}", created.id());
            created.id().to_string()
        }
    };

    let template = match template_id {
        Some(id) => Some(repo.get_template(id).await?),
        None => None,
    };

    let chat = ChatService::new(
        repo,
        backend,
        ChatSettings::from_config(&config.gateway, &config.ai),
    );

    let mut stdout = std::io::stdout();
    let reply = chat
        .send(&conversation_id, input, template.as_ref(), &mut |chunk: &str| {
            if let Err(err) = write!(stdout, "{}", chunk).and_then(|_| stdout.flush()) {
                log::trace!("Failed to write chunk to stdout: {}", err);
            }
        })
        .await?;
    println!();

    if let Some(title) = reply.title {
        verbose!("[+] Conversation titled \"{}\"", title);
    }
    Ok(())
}

async fn projects(config: &Configuration, action: Option<&ProjectAction>) -> Result<()> {
    let repo = workspace(config)?;
    match action.unwrap_or(&ProjectAction::List) {
        ProjectAction::List => {
            for p in repo.list_projects().await? {
                println!(
                    "{}  {}  {}  {}",
                    p.id,
                    p.color,
                    p.name,
                    p.description.as_deref().unwrap_or_default()
                );
            }
        }
        ProjectAction::Add {
            name,
            description,
            color,
        } => {
            let p = repo
                .create_project(NewProject {
                    name: name.clone(),
                    description: description.clone(),
                    color: color.clone(),
                })
                .await?;
            println!("{}", p.id);
        }
        ProjectAction::Delete { id } => repo.delete_project(id).await?,
    }
    Ok(())
}

async fn tasks(config: &Configuration, action: Option<&TaskAction>) -> Result<()> {
    let repo = workspace(config)?;
    let default = TaskAction::List { project: None };
    match action.unwrap_or(&default) {
        TaskAction::List { project } => {
            for t in repo.list_tasks(project.as_deref()).await? {
                println!("{}  {:?}  {:?}  {}", t.id, t.status, t.priority, t.title);
            }
        }
        TaskAction::Add {
            title,
            project,
            priority,
            description,
        } => {
            let t = repo
                .create_task(NewTask {
                    title: title.clone(),
                    project_id: project.clone(),
                    priority: (*priority).into(),
                    description: description.clone(),
                    ..Default::default()
                })
                .await?;
            println!("{}", t.id);
        }
        TaskAction::Start { id } => {
            repo.update_task(id, TaskUpdate::default().with_status(TaskStatus::InProgress))
                .await?;
        }
        TaskAction::Done { id } => {
            repo.update_task(id, TaskUpdate::default().with_status(TaskStatus::Done))
                .await?;
        }
        TaskAction::Delete { id } => repo.delete_task(id).await?,
        TaskAction::Due => {
            let tasks = repo.list_tasks(None).await?;
            let today = chrono::Local::now().date_naive();
            for (t, status) in due_tasks(&tasks, today, &chrono::Local) {
                println!("{}  {:<18}  {}", t.id, status.to_string(), t.title);
            }
        }
    }
    Ok(())
}

async fn notes(config: &Configuration, action: Option<&NoteAction>) -> Result<()> {
    let repo = workspace(config)?;
    let default = NoteAction::List {
        query: None,
        category: None,
        favorites: false,
    };
    match action.unwrap_or(&default) {
        NoteAction::List {
            query,
            category,
            favorites,
        } => {
            let category = category
                .as_deref()
                .map(str::parse::<NoteCategory>)
                .transpose()?;
            let notes = repo
                .search_notes(NoteQuery {
                    query: query.clone(),
                    category,
                    favorites_only: *favorites,
                })
                .await?;
            for n in notes {
                let star = if n.is_favorite { "*" } else { " " };
                println!("{} {}  [{}]  {}", star, n.id, n.category, n.title);
            }
        }
        NoteAction::Add {
            title,
            category,
            tags,
            content,
        } => {
            let category = category.parse::<NoteCategory>()?;
            let title = match title {
                Some(title) => title.clone(),
                None => note_title(config, content, category).await,
            };
            let n = repo
                .create_note(NewNote {
                    title,
                    content: content.clone(),
                    category,
                    tags: tags.clone(),
                    is_favorite: false,
                })
                .await?;
            println!("{}  {}", n.id, n.title);
        }
        NoteAction::Favorite { id } => {
            let n = repo.toggle_favorite(id).await?;
            println!("{}", if n.is_favorite { "starred" } else { "unstarred" });
        }
        NoteAction::Delete { id } => repo.delete_note(id).await?,
        NoteAction::Export { week, output } => {
            let now = chrono::Local::now();
            let period = if *week {
                ExportPeriod::week_of(now.date_naive())
            } else {
                ExportPeriod::day(now.date_naive())
            };
            let notes = repo.list_notes().await?;
            let markdown = render_markdown(&notes, &period, &chrono::Local, now);

            match output {
                Some(dir) => {
                    let path = std::path::Path::new(dir).join(period.file_name());
                    std::fs::write(&path, markdown)
                        .wrap_err(format!("writing {}", path.display()))?;
                    println!("{}", path.display());
                }
                None => print!("{}", markdown),
            }
        }
    }
    Ok(())
}

async fn data(config: &Configuration, action: &DataAction) -> Result<()> {
    let repo = workspace(config)?;
    match action {
        DataAction::Export { output } => {
            let json = export_workspace(&repo).await?.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(path, json).wrap_err(format!("writing {}", path))?;
                    println!("{}", path);
                }
                None => println!("{}", json),
            }
        }
        DataAction::Import { path, replace } => {
            let raw = std::fs::read_to_string(path).wrap_err(format!("reading {}", path))?;
            let export = WorkspaceExport::parse(&raw).wrap_err(format!("validating {}", path))?;
            if !*replace {
                eyre::bail!(
                    "{} holds {} projects and {} tasks; importing discards the current ones, \
                     rerun with --replace to confirm",
                    path,
                    export.projects.len(),
                    export.tasks.len()
                );
            }

            let imported = import_workspace(&repo, export, &config.general.user_id).await?;
            println!(
                "imported {} projects and {} tasks",
                imported.projects.len(),
                imported.tasks.len()
            );
        }
    }
    Ok(())
}

/// Asks the gateway for a title, or slices the content when no gateway is
/// configured.
async fn note_title(config: &Configuration, content: &str, category: NoteCategory) -> String {
    match new_backend(&config.gateway) {
        Ok(backend) => {
            TitleGenerator::new(backend, &config.gateway.default_model)
                .generate_note_title(content, category)
                .await
        }
        Err(err) => {
            log::warn!("Note title generation unavailable: {:#}", err);
            crate::backend::title::note_fallback_title(content)
        }
    }
}

async fn stats(config: &Configuration) -> Result<()> {
    let repo = workspace(config)?;
    let (tasks, notes) = tokio::try_join!(repo.list_tasks(None), repo.list_notes())?;

    let task_stats = TaskStats::from_tasks(&tasks);
    let note_stats = NotesStats::from_notes(&notes);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "tasks": task_stats,
            "notes": note_stats,
        }))?
    );
    Ok(())
}

fn models(config: &Configuration) {
    for m in AVAILABLE_MODELS {
        let marker = if m.name == config.gateway.default_model {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<30} {:<20} max_tokens={} temperature={}",
            marker, m.name, m.display_name, m.max_tokens, m.temperature
        );
    }
}

async fn check_key(config: &Configuration) -> Result<()> {
    if config.gateway.api_key.is_none() {
        eyre::bail!("no gateway api key configured, set gateway.api_key");
    }

    if !OpenAI::from(&config.gateway).validate_api_key().await {
        eyre::bail!("gateway rejected the api key");
    }
    println!("api key is valid");
    Ok(())
}

async fn reset_local(config: &Configuration) -> Result<()> {
    let kv = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    LocalStore::new(kv).clear().await?;
    println!("local AI records removed");
    Ok(())
}
