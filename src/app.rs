use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::api::RocketChatClient;
use crate::api::rooms::RoomRef;
use crate::api::types::SearchResponse;
use crate::command::{self, Command};
use crate::config::AppConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::i18n::Locale;
use crate::message::Message;
use crate::search::{self, Debouncer, SearchController, SearchRequest};
use crate::ui;

// ---------------------------------------------------------------------------
// Focus and mode
// ---------------------------------------------------------------------------

/// Which part of the search screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Command,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: AppConfig,
    pub locale: Locale,

    // Screen state
    pub focus: Focus,
    pub mode: AppMode,
    pub show_help: bool,
    pub selected_index: usize,
    pub reaction_index: usize,
    pub spinner_frame: usize,

    // Input state
    pub search_input: String,
    pub command_input: String,

    // Search
    pub debouncer: Debouncer<Event>,
    pub search: SearchController,
    pub room_label: String,

    // API client (shared with spawned tasks)
    pub api_client: Option<Arc<RocketChatClient>>,
    pub username: Option<String>,

    // Status
    pub status_message: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        api_client: Option<RocketChatClient>,
        room_id: String,
        room_label: String,
    ) -> Self {
        let events = EventHandler::new(config.tick_rate_fps);
        Self::with_events(config, api_client, room_id, room_label, events)
    }

    fn with_events(
        config: AppConfig,
        api_client: Option<RocketChatClient>,
        room_id: String,
        room_label: String,
        events: EventHandler,
    ) -> Self {
        let debouncer = Debouncer::new(config.debounce(), events.sender());
        let search = SearchController::new(room_id, config.page_size);
        let username = api_client
            .as_ref()
            .and_then(|c| c.username().map(str::to_owned));

        Self {
            running: true,
            events,
            locale: Locale::parse(&config.locale),
            config,
            focus: Focus::Input,
            mode: AppMode::Normal,
            show_help: false,
            selected_index: 0,
            reaction_index: 0,
            spinner_frame: 0,
            search_input: String::new(),
            command_input: String::new(),
            debouncer,
            search,
            room_label,
            api_client: api_client.map(Arc::new),
            username,
            status_message: None,
        }
    }

    // -- Main event loop ----------------------------------------------------

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key) = event
                        && key.kind == crossterm::event::KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(*app_event),
            }
        }
        self.teardown();
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        ui::draw(frame, self);
    }

    fn tick(&mut self) {
        let state = self.search.state();
        if state.searching || state.loading_more {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    /// Release the debounce timer and any in-flight search.
    fn teardown(&mut self) {
        self.debouncer.stop();
        self.search.teardown();
    }

    // -- Accessors used by the UI -------------------------------------------

    pub fn results(&self) -> &[Message] {
        self.search.results()
    }

    pub fn selected_message(&self) -> Option<&Message> {
        self.results().get(self.selected_index)
    }

    // -- Key event routing --------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent) {
        // Any keypress dismisses the last status message.
        self.status_message = None;

        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'C'))
        {
            self.events.send(AppEvent::Quit);
            return;
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        match (self.mode, self.focus) {
            (AppMode::Command, _) => self.handle_command_key(key),
            (AppMode::Normal, Focus::Input) => self.handle_input_key(key),
            (AppMode::Normal, Focus::List) => self.handle_list_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.events.send(AppEvent::Quit);
            }
            KeyCode::Enter => {
                // Skip the quiet period.
                self.debouncer.stop();
                let text = self.search_input.clone();
                self.start_search(text);
            }
            KeyCode::Tab | KeyCode::Down => {
                if !self.results().is_empty() {
                    self.focus = Focus::List;
                }
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.debouncer.push(self.search_input.clone());
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search_input.clear();
                self.debouncer.push(String::new());
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.debouncer.push(self.search_input.clone());
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.events.send(AppEvent::Quit);
            }
            KeyCode::Esc | KeyCode::Tab | KeyCode::Char('/') => {
                self.focus = Focus::Input;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected_index == 0 {
                    self.focus = Focus::Input;
                } else {
                    self.select(self.selected_index - 1);
                }
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.select(0);
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.select(self.results().len().saturating_sub(1));
                self.on_end_reached();
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.reaction_index = self.reaction_index.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                let count = self.selected_message().map_or(0, |m| m.reactions.len());
                if self.reaction_index + 1 < count {
                    self.reaction_index += 1;
                }
            }
            KeyCode::Enter => {
                self.press_selected_reaction();
            }
            KeyCode::Char(':') => {
                self.mode = AppMode::Command;
                self.command_input.clear();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                self.execute_command();
                self.mode = AppMode::Normal;
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) => {
                self.command_input.push(c);
            }
            _ => {}
        }
    }

    // -- Command execution --------------------------------------------------

    fn execute_command(&mut self) {
        let input = self.command_input.clone();
        match command::parse_command(&input) {
            Some(Command::Room(room)) => self.switch_room(room),
            Some(Command::React(emoji)) => match self.selected_message() {
                Some(message) => {
                    let message_id = message.id.clone();
                    self.events
                        .send(AppEvent::ToggleReaction { message_id, emoji });
                }
                None => {
                    self.status_message = Some("No message selected".to_string());
                }
            },
            Some(Command::Help) => {
                self.show_help = true;
            }
            Some(Command::Quit) => {
                self.events.send(AppEvent::Quit);
            }
            None => {
                self.status_message = Some(format!("Unknown command: {input}"));
            }
        }
        self.command_input.clear();
    }

    // -- Selection helpers --------------------------------------------------

    fn select(&mut self, index: usize) {
        if index != self.selected_index {
            self.reaction_index = 0;
        }
        self.selected_index = index;
    }

    fn move_selection_down(&mut self) {
        let count = self.results().len();
        if self.selected_index + 1 < count {
            self.select(self.selected_index + 1);
        }
        if self.selected_index + 1 >= count {
            self.on_end_reached();
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.results().len();
        if count == 0 {
            self.selected_index = 0;
            self.reaction_index = 0;
            self.focus = Focus::Input;
        } else if self.selected_index >= count {
            self.select(count - 1);
        }
    }

    /// The list was scrolled to its last item.
    fn on_end_reached(&mut self) {
        if let Some(request) = self.search.request_more() {
            self.dispatch_search(request);
        }
    }

    fn press_selected_reaction(&mut self) {
        let Some(message) = self.selected_message() else {
            return;
        };
        if let Some(reaction) = message.reactions.get(self.reaction_index) {
            self.events.send(AppEvent::ToggleReaction {
                message_id: message.id.clone(),
                emoji: reaction.emoji.clone(),
            });
        }
    }

    // -- Search -------------------------------------------------------------

    fn start_search(&mut self, text: String) {
        let request = self.search.trigger_search(text);
        self.select(0);
        self.dispatch_search(request);
    }

    fn switch_room(&mut self, room: RoomRef) {
        match room {
            RoomRef::Id(id) => {
                self.room_label = id.clone();
                self.apply_room(id);
            }
            RoomRef::Name(name) => self.dispatch_room_lookup(name),
        }
    }

    fn apply_room(&mut self, room_id: String) {
        self.select(0);
        if let Some(request) = self.search.set_room(room_id) {
            self.dispatch_search(request);
        }
    }

    // -- App event handling -------------------------------------------------

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => {
                self.running = false;
            }

            AppEvent::SearchRequested(debounced) => {
                if let Some(text) = self.debouncer.accept(debounced) {
                    self.start_search(text);
                }
            }
            AppEvent::SearchLoaded {
                generation,
                outcome,
            } => {
                if self.search.apply(generation, outcome) {
                    self.clamp_selection();
                }
            }

            AppEvent::ToggleReaction { message_id, emoji } => {
                self.dispatch_reaction(message_id, emoji);
            }
            AppEvent::ReactionSet {
                message_id,
                emoji,
                result,
            } => match result {
                Ok(()) => {
                    tracing::debug!(%message_id, %emoji, "reaction set");
                    if let Some(request) = self.search.refresh() {
                        self.dispatch_search(request);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        context = "search_view.on_reaction_press",
                        %message_id,
                        %emoji,
                        %error,
                        "set reaction failed"
                    );
                }
            },

            AppEvent::RoomResolved { name, result } => match result {
                Ok(room_id) => {
                    self.room_label = format!("#{name}");
                    self.apply_room(room_id);
                }
                Err(e) => {
                    tracing::warn!(context = "search_view.room", %name, error = %e, "room lookup failed");
                    self.status_message = Some(format!("Room #{name} not found: {e}"));
                }
            },
        }
    }

    // -- API dispatch -------------------------------------------------------

    fn dispatch_search(&self, request: SearchRequest) {
        let sender = self.events.sender();
        let Some(ref client) = self.api_client else {
            // Report through the normal path so loading flags are cleared.
            let outcome = search::SearchOutcome::Failed(no_client());
            let _ = sender.send(Event::App(Box::new(AppEvent::SearchLoaded {
                generation: request.generation,
                outcome,
            })));
            return;
        };
        let client = Arc::clone(client);

        tokio::spawn(async move {
            let remote = async {
                client
                    .message_search(
                        &request.text,
                        &request.room_id,
                        request.offset,
                        request.count,
                    )
                    .await
                    .map(SearchResponse::into_docs)
            };
            let outcome = search::race_cancel(&request.cancel, remote).await;
            let _ = sender.send(Event::App(Box::new(AppEvent::SearchLoaded {
                generation: request.generation,
                outcome,
            })));
        });
    }

    fn dispatch_reaction(&self, message_id: String, emoji: String) {
        let sender = self.events.sender();
        let Some(ref client) = self.api_client else {
            let _ = sender.send(Event::App(Box::new(AppEvent::ReactionSet {
                message_id,
                emoji,
                result: Err(no_client()),
            })));
            return;
        };
        let client = Arc::clone(client);

        tokio::spawn(async move {
            let result = client
                .set_reaction(&emoji, &message_id)
                .await
                .map_err(|e| Arc::new(e.to_string()));
            let _ = sender.send(Event::App(Box::new(AppEvent::ReactionSet {
                message_id,
                emoji,
                result,
            })));
        });
    }

    fn dispatch_room_lookup(&self, name: String) {
        let sender = self.events.sender();
        let Some(ref client) = self.api_client else {
            let _ = sender.send(Event::App(Box::new(AppEvent::RoomResolved {
                name,
                result: Err(no_client()),
            })));
            return;
        };
        let client = Arc::clone(client);

        tokio::spawn(async move {
            let result = client
                .room_id_by_name(&name)
                .await
                .map_err(|e| Arc::new(e.to_string()));
            let _ = sender.send(Event::App(Box::new(AppEvent::RoomResolved { name, result })));
        });
    }
}

fn no_client() -> Arc<String> {
    Arc::new("no API client".to_string())
}
