//! Test doubles shared by the runner and session tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{Callback, Task, Verbosity};
use crate::error::FailureCause;
use crate::ports::{Choice, Console};
use crate::queue::{SqliteQueue, TaskQueue};
use crate::runtime::{HandlerRegistry, Outcome, TaskContext, TaskHandler};

pub(crate) const RECORD: &str = "Test::record";
pub(crate) const FAIL: &str = "Test::fail";
pub(crate) const DECLINE: &str = "Test::decline";
pub(crate) const SPAWN: &str = "Test::spawn";
pub(crate) const PANIC: &str = "Test::panic";
pub(crate) const NOTE: &str = "Test::note";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Write(String),
    Line(String),
    Prompt(String),
}

/// Console that answers prompts from a script and records everything.
pub(crate) struct ScriptedConsole {
    verbosity: Verbosity,
    answers: Mutex<VecDeque<String>>,
    events: Mutex<Vec<Event>>,
}

impl ScriptedConsole {
    pub(crate) fn new(verbosity: Verbosity) -> Self {
        Self::with_answers(verbosity, &[])
    }

    pub(crate) fn with_answers(verbosity: Verbosity, answers: &[&str]) -> Self {
        Self {
            verbosity,
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Everything written, as the terminal would show it (prompts excluded).
    pub(crate) fn output(&self) -> String {
        let mut out = String::new();
        for event in self.events() {
            match event {
                Event::Write(s) => out.push_str(&s),
                Event::Line(s) => {
                    out.push_str(&s);
                    out.push('\n');
                }
                Event::Prompt(_) => {}
            }
        }
        out
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Line(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn prompts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Prompt(_)))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn next_answer(&self) -> Option<String> {
        self.answers.lock().unwrap().pop_front()
    }
}

impl Console for ScriptedConsole {
    fn write(&self, text: &str) -> io::Result<()> {
        self.push(Event::Write(text.to_string()));
        Ok(())
    }

    fn write_line(&self, text: &str) -> io::Result<()> {
        self.push(Event::Line(text.to_string()));
        Ok(())
    }

    fn choice(&self, question: &str, _choices: &[Choice<'_>], default: &str) -> io::Result<String> {
        self.push(Event::Prompt(question.to_string()));
        Ok(self.next_answer().unwrap_or_else(|| default.to_string()))
    }

    fn confirm(&self, question: &str, default: bool) -> io::Result<bool> {
        self.push(Event::Prompt(question.to_string()));
        Ok(self
            .next_answer()
            .map(|a| a.starts_with('y'))
            .unwrap_or(default))
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Names passed to test handlers, in invocation order.
#[derive(Clone, Default)]
pub(crate) struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn push(&self, args: &[serde_json::Value]) {
        let name = args
            .first()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.0.lock().unwrap().push(name);
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

struct Scripted {
    calls: Calls,
    behaviour: Behaviour,
}

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Decline,
    Spawn,
    Panic,
    Note,
}

#[async_trait]
impl TaskHandler for Scripted {
    async fn handle(
        &self,
        ctx: &TaskContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<Outcome, FailureCause> {
        self.calls.push(args);
        match self.behaviour {
            Behaviour::Succeed => Ok(Outcome::Done),
            Behaviour::Fail => Err(FailureCause::handler("boom")),
            Behaviour::Decline => Ok(Outcome::Declined),
            Behaviour::Spawn => {
                let child = args
                    .get(1)
                    .and_then(|v| v.as_str())
                    .unwrap_or("child")
                    .to_string();
                ctx.log().info(&format!("spawning {child}"));
                ctx.queue()
                    .enqueue(task(&child))
                    .await
                    .map_err(FailureCause::handler)?;
                Ok(Outcome::Done)
            }
            Behaviour::Panic => panic!("handler blew up"),
            Behaviour::Note => {
                let note = args.first().and_then(|v| v.as_str()).unwrap_or_default();
                ctx.record_message(&format!("{note} done"))
                    .await
                    .map_err(FailureCause::handler)?;
                Ok(Outcome::Done)
            }
        }
    }
}

pub(crate) fn registry(calls: &Calls) -> HandlerRegistry {
    let mut reg = HandlerRegistry::new();
    for (callback, behaviour) in [
        (RECORD, Behaviour::Succeed),
        (FAIL, Behaviour::Fail),
        (DECLINE, Behaviour::Decline),
        (SPAWN, Behaviour::Spawn),
        (PANIC, Behaviour::Panic),
        (NOTE, Behaviour::Note),
    ] {
        reg.register(
            &Callback::parse(callback),
            Arc::new(Scripted {
                calls: calls.clone(),
                behaviour,
            }),
        )
        .unwrap();
    }
    reg
}

/// Task whose first argument is its title, so `Calls` can name it.
pub(crate) fn task_with(callback: &str, title: &str) -> Task {
    Task::new(title, Callback::parse(callback), vec![json!(title)])
}

pub(crate) fn task(title: &str) -> Task {
    task_with(RECORD, title)
}

pub(crate) async fn fill(queue: &SqliteQueue, tasks: Vec<Task>) {
    for t in tasks {
        queue.enqueue(t).await.unwrap();
    }
}
