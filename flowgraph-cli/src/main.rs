//! `flowgraph` binary: parses the subcommand, runs the workflow and prints the result.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use flowgraph::{LlmClient, ToolSpec};
use flowgraph_cli::graphs::support;
use flowgraph_cli::{
    init_tracing, resume_support, run_chat, run_code_assist, run_support, thread_history, Error,
    Message, MessagesState, RunConfig, RunOptions, RunOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "flowgraph")]
#[command(about = "Checkpointed workflow graphs: code assistant, chat, human-in-the-loop support")]
struct Cli {
    /// Debug logs for graph and node execution (stderr).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite file for chat/support threads (overrides DB_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<String>,

    /// Model name (overrides OPENAI_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature 0 to 2 (overrides OPENAI_TEMPERATURE).
    #[arg(long, global = true)]
    temperature: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ThreadArgs {
    /// Thread (session) id.
    #[arg(short, long)]
    thread: String,

    /// Message text; words are joined with spaces.
    #[arg(required = true, trailing_var_arg = true)]
    text: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify, answer and (for coding questions) validate with up to 3 retries.
    CodeAssist {
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// One turn of a checkpointed conversation.
    Chat(ThreadArgs),
    /// One turn of a support conversation that may ask a human operator.
    Support(ThreadArgs),
    /// Operator answer for a support thread waiting on human assistance.
    Resume(ThreadArgs),
    /// Print the checkpoints of a thread.
    History {
        #[arg(short, long)]
        thread: String,
    },
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: None,
            db_path: self.db.clone(),
            verbose: self.verbose,
        }
    }
}

#[cfg(feature = "openai")]
fn llm_for(config: &RunConfig, tools: Vec<ToolSpec>) -> Result<Arc<dyn LlmClient>, Error> {
    flowgraph_cli::build_llm(config, tools)
}

#[cfg(not(feature = "openai"))]
fn llm_for(_config: &RunConfig, _tools: Vec<ToolSpec>) -> Result<Arc<dyn LlmClient>, Error> {
    Err("this build has no LLM client; rebuild with feature `openai`".into())
}

fn print_message(m: &Message) {
    match m {
        Message::System { content } => println!("[System] {}", content),
        Message::User { content } => println!("[User] {}", content),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            if !content.is_empty() {
                println!("[Assistant] {}", content);
            }
            for call in tool_calls {
                println!("[Assistant] calls {}({})", call.name, call.arguments);
            }
        }
        Message::Tool { name, content, .. } => println!("[Tool {}] {}", name, content),
    }
}

/// Prints what the turn added after `seen` messages, or the pending request.
fn print_outcome(out: &RunOutcome<MessagesState>, seen: usize) {
    for m in out.state().messages.iter().skip(seen) {
        print_message(m);
    }
    if let Some(interrupt) = out.interrupt() {
        println!("---");
        println!("Waiting for a human operator: {}", interrupt.value);
        println!("Answer with: flowgraph resume --thread <id> <solution>");
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = RunConfig::from_env()?;
    config.apply_options(&cli.options());

    match cli.command {
        Command::CodeAssist { query } => {
            let query = query.join(" ");
            println!("User: {}", query);
            println!("---");
            let llm = llm_for(&config, vec![])?;
            let state = run_code_assist(&config, llm, &query, |node_id, state| {
                println!("[{}] retry_count={}", node_id, state.retry_count);
            })
            .await?;
            println!("---");
            if let Some(accuracy) = state.accuracy {
                println!("Accuracy: {}%", accuracy);
            }
            println!("{}", state.llm_code.unwrap_or_default());
        }
        Command::Chat(args) => {
            let llm = llm_for(&config, vec![])?;
            let out = run_chat(&config, llm, &args.thread, &args.text.join(" ")).await?;
            let seen = out.state().messages.len().saturating_sub(1);
            print_outcome(&out, seen);
        }
        Command::Support(args) => {
            let llm = llm_for(&config, support::tool_specs())?;
            let before = thread_history(&config, &args.thread)
                .await?
                .checkpoints
                .last()
                .map(|c| c.channel_values.messages.len())
                .unwrap_or(0);
            let out = run_support(&config, llm, &args.thread, &args.text.join(" ")).await?;
            print_outcome(&out, before + 1);
        }
        Command::Resume(args) => {
            let history = thread_history(&config, &args.thread).await?;
            let Some(pending) = history.pending else {
                return Err(format!("thread `{}` is not waiting for an operator", args.thread).into());
            };
            println!("Request: {}", pending.value);
            let before = history
                .checkpoints
                .last()
                .map(|c| c.channel_values.messages.len())
                .unwrap_or(0);
            let llm = llm_for(&config, support::tool_specs())?;
            let out = resume_support(&config, llm, &args.thread, &args.text.join(" ")).await?;
            print_outcome(&out, before);
        }
        Command::History { thread } => {
            let history = thread_history(&config, &thread).await?;
            if history.checkpoints.is_empty() {
                println!("thread `{}` has no checkpoints", thread);
            }
            for c in &history.checkpoints {
                println!(
                    "#{} step={} node={} source={} messages={}",
                    c.metadata.seq,
                    c.metadata.step,
                    c.metadata.node_id.as_deref().unwrap_or("-"),
                    c.metadata.source.as_str(),
                    c.channel_values.messages.len()
                );
            }
            if let Some(pending) = history.pending {
                println!("pending: {} {}", pending.node_id, pending.value);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
