use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use gpui::{
    App, AppContext, Application, Bounds, Context, Hsla, InteractiveElement, IntoElement,
    KeyDownEvent, MouseButton, ParentElement, Render, Styled, Task, Window, WindowBounds,
    WindowOptions, div, hsla, prelude::*, px, rgb, size,
};
use helm_core::{ChatMessage, KnowledgeEntry, MessageRole, Provider, ProviderPatch};
use helm_services::{AppServices, AppServicesBuilder, PendingReply};
use pulldown_cmark::{Event, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFocus {
    None,
    Chat,
    ApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Unchanged,
    Changed,
    Submit,
}

struct HelmAppView {
    services: AppServices,
    providers: Vec<Provider>,
    knowledge: Vec<KnowledgeEntry>,
    messages: Vec<ChatMessage>,
    selected_provider: Option<Uuid>,
    config_provider: Option<Uuid>,
    api_key_input: String,
    show_api_key: bool,
    chat_input: String,
    focus: InputFocus,
    pending_reply: Option<PendingReply>,
    _reply_poll: Option<Task<()>>,
    status: String,
}

impl HelmAppView {
    fn new(services: AppServices) -> Self {
        let mut view = Self {
            services,
            providers: Vec::new(),
            knowledge: Vec::new(),
            messages: Vec::new(),
            selected_provider: None,
            config_provider: None,
            api_key_input: String::new(),
            show_api_key: false,
            chat_input: String::new(),
            focus: InputFocus::None,
            pending_reply: None,
            _reply_poll: None,
            status: String::new(),
        };
        view.refresh();
        view.status = view.summary_line();
        view
    }

    fn refresh(&mut self) {
        self.providers = self.services.providers();
        self.knowledge = self.services.knowledge();
        self.selected_provider = self.services.selected_provider();
        self.messages = match self.selected_provider {
            Some(provider_id) => self.services.messages_for(provider_id),
            None => Vec::new(),
        };
    }

    fn summary_line(&self) -> String {
        let summary = self.services.flow_summary();
        format!(
            "{} providers ({} active), {} knowledge entries ({} locked), {} messages",
            self.providers.len(),
            summary.active_providers.len(),
            summary.total_entries,
            summary.locked_entries,
            summary.total_messages
        )
    }

    fn selected(&self) -> Option<&Provider> {
        self.selected_provider
            .and_then(|id| self.providers.iter().find(|provider| provider.id == id))
    }

    fn provider(&self, id: Uuid) -> Option<&Provider> {
        self.providers.iter().find(|provider| provider.id == id)
    }

    fn cancel_pending_reply(&mut self) {
        self.pending_reply = None;
        self._reply_poll = None;
    }

    fn toggle_provider(&mut self, id: Uuid) {
        let Some(provider) = self.provider(id).cloned() else {
            return;
        };

        if !provider.enabled && !provider.has_api_key() {
            self.open_config(id);
            return;
        }

        match self
            .services
            .update_provider(id, ProviderPatch::enabled(!provider.enabled))
        {
            Ok(_) => {
                self.status = format!(
                    "{} {}",
                    provider.name,
                    if provider.enabled { "disabled" } else { "enabled" }
                );
            }
            Err(error) => self.status = format!("toggle provider failed: {error}"),
        }
        self.refresh();
    }

    fn open_config(&mut self, id: Uuid) {
        let Some(provider) = self.provider(id) else {
            return;
        };
        self.api_key_input = provider.api_key.clone();
        self.show_api_key = false;
        self.config_provider = Some(id);
        self.focus = InputFocus::ApiKey;
    }

    fn save_config(&mut self) {
        let Some(id) = self.config_provider else {
            return;
        };
        if let Err(error) = self.services.configure_provider(id, self.api_key_input.clone()) {
            self.status = format!("save configuration failed: {error}");
        } else {
            self.status = "Configuration saved".to_owned();
        }
        self.close_config();
    }

    fn close_config(&mut self) {
        if let Some(id) = self.config_provider.take() {
            self.refresh();
            if self.provider(id).is_some_and(|provider| provider.enabled) {
                self.select_provider(Some(id));
            }
        }
        self.api_key_input.clear();
        self.focus = InputFocus::None;
        self.refresh();
    }

    fn select_provider(&mut self, id: Option<Uuid>) {
        if id != self.selected_provider {
            self.cancel_pending_reply();
        }
        if let Err(error) = self.services.select_provider(id) {
            self.status = format!("select provider failed: {error}");
        }
        self.refresh();
    }

    fn send_chat_message(&mut self, cx: &mut Context<Self>) {
        let input = self.chat_input.trim().to_owned();
        if input.is_empty() || self.pending_reply.is_some() {
            return;
        }
        let Some(provider) = self.selected().cloned() else {
            return;
        };
        if !provider.enabled {
            return;
        }

        match self.services.send_chat_message(provider.id, input) {
            Ok((_message, pending)) => {
                self.chat_input.clear();
                self.pending_reply = Some(pending);
                self._reply_poll = Some(self.spawn_reply_poll(cx));
                self.status = format!("Waiting for {}", provider.name);
            }
            Err(error) => self.status = format!("send message failed: {error}"),
        }
        self.refresh();
    }

    // Watches the scheduled reply and refreshes the view once it lands. The
    // task dies with the view, and cancel_pending_reply drops it together
    // with the PendingReply it watches.
    fn spawn_reply_poll(&self, cx: &mut Context<Self>) -> Task<()> {
        cx.spawn(async move |this, cx| {
            loop {
                cx.background_executor()
                    .timer(Duration::from_millis(100))
                    .await;

                let finished = this
                    .update(cx, |view, cx| {
                        let finished = view
                            .pending_reply
                            .as_ref()
                            .is_none_or(|pending| pending.is_finished());
                        if finished {
                            view.pending_reply = None;
                            view.refresh();
                            view.status = view.summary_line();
                            cx.notify();
                        }
                        finished
                    })
                    .unwrap_or(true);

                if finished {
                    break;
                }
            }
        })
    }

    fn clear_history(&mut self) {
        self.cancel_pending_reply();
        if let Err(error) = self.services.clear_history() {
            self.status = format!("clear history failed: {error}");
        } else {
            self.status = "Chat history cleared".to_owned();
        }
        self.refresh();
    }

    fn lock_message(&mut self, message_id: Uuid) {
        match self.services.lock_message_to_knowledge(message_id) {
            Ok(Some(entry)) => self.status = format!("Locked to knowledge base: {}", entry.source),
            Ok(None) => self.status = "Message no longer exists".to_owned(),
            Err(error) => self.status = format!("lock message failed: {error}"),
        }
        self.refresh();
    }

    fn toggle_knowledge_lock(&mut self, entry_id: Uuid) {
        match self.services.toggle_knowledge_lock(entry_id) {
            Ok(Some(locked)) => {
                self.status = if locked {
                    "Entry locked".to_owned()
                } else {
                    "Entry unlocked".to_owned()
                };
            }
            Ok(None) => self.status = "Entry no longer exists".to_owned(),
            Err(error) => self.status = format!("toggle lock failed: {error}"),
        }
        self.refresh();
    }

    fn remove_knowledge(&mut self, entry_id: Uuid) {
        match self.services.remove_knowledge(entry_id) {
            Ok(true) => self.status = "Entry deleted".to_owned(),
            Ok(false) => self.status = "Entry no longer exists".to_owned(),
            Err(error) => self.status = format!("delete entry failed: {error}"),
        }
        self.refresh();
    }

    fn handle_key(&mut self, event: &KeyDownEvent, cx: &mut Context<Self>) {
        let key = event.keystroke.key.as_str();
        if key == "escape" {
            if self.config_provider.is_some() {
                self.close_config();
            } else {
                self.focus = InputFocus::None;
            }
            return;
        }

        let shift = event.keystroke.modifiers.shift;
        match self.focus {
            InputFocus::Chat => {
                if apply_key(&mut self.chat_input, key, shift) == KeyOutcome::Submit {
                    self.send_chat_message(cx);
                }
            }
            InputFocus::ApiKey => {
                if apply_key(&mut self.api_key_input, key, shift) == KeyOutcome::Submit {
                    self.save_config();
                }
            }
            InputFocus::None => {}
        }
    }

    fn render_header(&self) -> impl IntoElement {
        let summary = self.services.flow_summary();
        div()
            .flex()
            .gap_3()
            .p_3()
            .bg(rgb(0x1e1b4b))
            .text_color(rgb(0xf1f5f9))
            .child(div().text_xl().child("🧠 Helm Control Center"))
            .child(
                div()
                    .text_sm()
                    .text_color(rgb(0x94a3b8))
                    .child("Unified knowledge base for all your AI agents"),
            )
            .child(div().flex_1())
            .child(div().text_sm().child(format!(
                "{} active · {} locked",
                summary.active_providers.len(),
                summary.locked_entries
            )))
    }

    fn render_provider_card(&self, provider: &Provider, cx: &mut Context<Self>) -> impl IntoElement {
        let provider_id = provider.id;
        let is_selected = self.selected_provider == Some(provider_id);
        let status_line = if provider.enabled {
            "⚡ Active"
        } else {
            "⚙ Configure to activate"
        };
        let border_color: Hsla = if is_selected {
            accent_rgb(&provider.accent_color).into()
        } else {
            hsla(0.0, 0.0, 1.0, 0.08)
        };

        div()
            .p_2()
            .rounded_md()
            .bg(if provider.enabled {
                rgb(0x1f2937)
            } else {
                rgb(0x111827)
            })
            .border_1()
            .border_color(border_color)
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(move |this, _event, _window, cx| {
                    this.open_config(provider_id);
                    cx.notify();
                }),
            )
            .child(
                div()
                    .flex()
                    .gap_2()
                    .child(div().child(provider.icon.clone()))
                    .child(div().child(provider.name.clone()))
                    .child(div().flex_1())
                    .child(
                        div()
                            .px_3()
                            .py_1()
                            .rounded_sm()
                            .bg(if provider.enabled {
                                rgb(0x14532d)
                            } else {
                                rgb(0x334155)
                            })
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(move |this, _event, _window, cx| {
                                    cx.stop_propagation();
                                    this.toggle_provider(provider_id);
                                    cx.notify();
                                }),
                            )
                            .child("⏻"),
                    ),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(rgb(0x94a3b8))
                    .child(format!("{} · {}", provider.kind.label(), status_line)),
            )
    }

    fn render_flow_panel(&self) -> impl IntoElement {
        let summary = self.services.flow_summary();
        let mut panel = div()
            .p_2()
            .rounded_md()
            .bg(rgb(0x111827))
            .flex()
            .flex_col()
            .gap_1()
            .child(div().child("Data Flow"))
            .child(div().text_sm().text_color(rgb(0x94a3b8)).child(format!(
                "{} active · {} locked",
                summary.active_providers.len(),
                summary.locked_entries
            )));

        if summary.active_providers.is_empty() {
            panel = panel.child(div().text_sm().text_color(rgb(0x64748b)).child("No active providers"));
        }
        for provider in &summary.active_providers {
            panel = panel.child(div().text_sm().child(format!(
                "{} {} ⇄ 🗄 {}",
                provider.icon, provider.name, summary.locked_entries
            )));
        }

        panel.child(
            div()
                .text_sm()
                .text_color(rgb(0xa78bfa))
                .child("Knowledge locked from any provider is instantly available to all others"),
        )
    }

    fn render_provider_panel(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let mut panel = div()
            .id("providers")
            .flex()
            .flex_col()
            .gap_2()
            .w(px(300.))
            .h_full()
            .p_3()
            .bg(rgb(0x0f172a))
            .overflow_y_scroll()
            .child(div().child("AI Providers"));

        for provider in self.providers.clone() {
            panel = panel.child(self.render_provider_card(&provider, cx));
        }

        panel.child(self.render_flow_panel())
    }

    fn render_config_panel(&self, provider: &Provider, cx: &mut Context<Self>) -> impl IntoElement {
        let shown_key = if self.show_api_key {
            self.api_key_input.clone()
        } else {
            "•".repeat(self.api_key_input.chars().count())
        };
        let key_field = format!(
            "{}{}",
            shown_key,
            if self.focus == InputFocus::ApiKey { "▏" } else { "" }
        );

        div()
            .flex()
            .flex_col()
            .flex_1()
            .gap_2()
            .p_3()
            .bg(rgb(0x0f172a))
            .child(div().text_xl().child(format!(
                "{} {} · Configure API Access",
                provider.icon, provider.name
            )))
            .child(
                div()
                    .p_2()
                    .rounded_md()
                    .bg(rgb(0x172554))
                    .text_sm()
                    .child(
                        "Demo mode: keys are stored locally and never used for real API calls.",
                    ),
            )
            .child(div().text_sm().child("API Key:"))
            .child(
                div()
                    .p_2()
                    .rounded_md()
                    .bg(rgb(0x1f2937))
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _event, _window, cx| {
                            this.focus = InputFocus::ApiKey;
                            cx.notify();
                        }),
                    )
                    .child(if key_field.is_empty() {
                        format!("Enter your {} API key", provider.name)
                    } else {
                        key_field
                    }),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(rgb(0xa78bfa))
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _event, _window, cx| {
                            this.show_api_key = !this.show_api_key;
                            cx.notify();
                        }),
                    )
                    .child(if self.show_api_key {
                        "Hide API Key"
                    } else {
                        "Show API Key"
                    }),
            )
            .child(
                div()
                    .flex()
                    .gap_2()
                    .child(
                        div()
                            .px_3()
                            .py_1()
                            .rounded_md()
                            .bg(rgb(0x7c3aed))
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|this, _event, _window, cx| {
                                    this.save_config();
                                    cx.notify();
                                }),
                            )
                            .child("💾 Save Configuration"),
                    )
                    .child(
                        div()
                            .px_3()
                            .py_1()
                            .rounded_md()
                            .bg(rgb(0x334155))
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|this, _event, _window, cx| {
                                    this.close_config();
                                    cx.notify();
                                }),
                            )
                            .child("Cancel"),
                    ),
            )
    }

    fn render_message(&self, message: &ChatMessage, cx: &mut Context<Self>) -> impl IntoElement {
        let message_id = message.id;
        let mut bubble = div()
            .p_2()
            .rounded_md()
            .bg(match message.role {
                MessageRole::User => rgb(0x4c1d95),
                MessageRole::Assistant => rgb(0x1f2937),
            })
            .whitespace_normal()
            .child(flatten_markdown(&message.content));

        if message.role == MessageRole::Assistant {
            bubble = bubble.child(
                div()
                    .text_sm()
                    .text_color(rgb(0xa78bfa))
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(move |this, _event, _window, cx| {
                            this.lock_message(message_id);
                            cx.notify();
                        }),
                    )
                    .child("🔒 Lock to Knowledge Base"),
            );
        }

        bubble
    }

    fn render_chat_panel(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let Some(provider) = self.selected().cloned() else {
            return div()
                .flex()
                .flex_col()
                .flex_1()
                .p_3()
                .bg(rgb(0x0f172a))
                .text_color(rgb(0x94a3b8))
                .child("🤖 Select a provider to start chatting");
        };

        if !provider.enabled {
            return div()
                .flex()
                .flex_col()
                .flex_1()
                .p_3()
                .bg(rgb(0x0f172a))
                .text_color(rgb(0x94a3b8))
                .child(format!("✨ Configure and enable {} to start", provider.name))
                .child(
                    div()
                        .text_sm()
                        .child("Add your API key in the provider settings"),
                );
        }

        let locked_count = self.knowledge.iter().filter(|entry| entry.locked).count();
        let mut messages = div()
            .id("chat-messages")
            .flex()
            .flex_col()
            .flex_1()
            .gap_2()
            .overflow_y_scroll();

        if self.messages.is_empty() {
            messages = messages
                .child(
                    div()
                        .text_color(rgb(0x64748b))
                        .child(format!("Start a conversation with {}", provider.name)),
                )
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x64748b))
                        .child("Your locked knowledge will be available across all providers"),
                );
        }
        for message in self.messages.clone() {
            messages = messages.child(self.render_message(&message, cx));
        }
        if self.pending_reply.is_some() {
            messages = messages.child(
                div()
                    .text_sm()
                    .text_color(rgb(0x94a3b8))
                    .child(format!("{} is thinking…", provider.name)),
            );
        }

        let input_line = format!(
            "{}{}",
            self.chat_input,
            if self.focus == InputFocus::Chat { "▏" } else { "" }
        );

        div()
            .flex()
            .flex_col()
            .flex_1()
            .gap_2()
            .p_3()
            .bg(rgb(0x0f172a))
            .child(
                div()
                    .flex()
                    .gap_2()
                    .child(div().child(format!("{} {}", provider.icon, provider.name)))
                    .child(div().text_sm().text_color(rgb(0x94a3b8)).child(format!(
                        "{locked_count} knowledge entries available"
                    )))
                    .child(div().flex_1())
                    .child(
                        div()
                            .text_sm()
                            .text_color(rgb(0x94a3b8))
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|this, _event, _window, cx| {
                                    this.clear_history();
                                    cx.notify();
                                }),
                            )
                            .child("🗑 Clear History"),
                    ),
            )
            .child(messages)
            .child(
                div()
                    .flex()
                    .gap_2()
                    .child(
                        div()
                            .flex_1()
                            .p_2()
                            .rounded_md()
                            .bg(rgb(0x1f2937))
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|this, _event, _window, cx| {
                                    this.focus = InputFocus::Chat;
                                    cx.notify();
                                }),
                            )
                            .child(if input_line.is_empty() {
                                "Type your message…".to_owned()
                            } else {
                                input_line
                            }),
                    )
                    .child(
                        div()
                            .px_3()
                            .py_1()
                            .rounded_md()
                            .bg(rgb(0x7c3aed))
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|this, _event, _window, cx| {
                                    this.send_chat_message(cx);
                                    cx.notify();
                                }),
                            )
                            .child("➤ Send"),
                    ),
            )
    }

    fn render_knowledge_entry(
        &self,
        entry: &KnowledgeEntry,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let entry_id = entry.id;
        let mut card = div()
            .p_2()
            .rounded_md()
            .bg(if entry.locked {
                rgb(0x312e81)
            } else {
                rgb(0x111827)
            })
            .flex()
            .flex_col()
            .gap_1()
            .whitespace_normal()
            .child(div().text_sm().child(entry.content.clone()))
            .child(div().text_sm().text_color(rgb(0x94a3b8)).child(format!(
                "🕒 {} · 🏷 {}",
                entry.created_at.format("%b %d, %H:%M"),
                entry.source
            )));

        if !entry.tags.is_empty() {
            card = card.child(
                div()
                    .text_sm()
                    .text_color(rgb(0x60a5fa))
                    .child(entry.tags.join(" · ")),
            );
        }

        card.child(
            div()
                .flex()
                .gap_2()
                .text_sm()
                .child(
                    div()
                        .text_color(rgb(0xa78bfa))
                        .on_mouse_down(
                            MouseButton::Left,
                            cx.listener(move |this, _event, _window, cx| {
                                this.toggle_knowledge_lock(entry_id);
                                cx.notify();
                            }),
                        )
                        .child(if entry.locked { "🔒 Unlock" } else { "🔓 Lock" }),
                )
                .child(
                    div()
                        .text_color(rgb(0xf87171))
                        .on_mouse_down(
                            MouseButton::Left,
                            cx.listener(move |this, _event, _window, cx| {
                                this.remove_knowledge(entry_id);
                                cx.notify();
                            }),
                        )
                        .child("🗑 Delete"),
                ),
        )
    }

    fn render_knowledge_panel(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let locked_count = self.knowledge.iter().filter(|entry| entry.locked).count();
        let mut panel = div()
            .id("knowledge")
            .flex()
            .flex_col()
            .gap_2()
            .w(px(320.))
            .h_full()
            .p_3()
            .bg(rgb(0x0f172a))
            .overflow_y_scroll()
            .child(div().child("Knowledge Base"))
            .child(div().text_sm().text_color(rgb(0x94a3b8)).child(format!(
                "{} locked · {} total",
                locked_count,
                self.knowledge.len()
            )));

        if self.knowledge.is_empty() {
            panel = panel
                .child(div().text_color(rgb(0x64748b)).child("No knowledge entries yet"))
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x64748b))
                        .child("Lock insights from your chats to save them here"),
                );
        }
        for entry in self.knowledge.clone() {
            panel = panel.child(self.render_knowledge_entry(&entry, cx));
        }

        panel
    }
}

impl Render for HelmAppView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let center = match self.config_provider.and_then(|id| self.provider(id).cloned()) {
            Some(provider) => self.render_config_panel(&provider, cx).into_any_element(),
            None => self.render_chat_panel(cx).into_any_element(),
        };

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(rgb(0x0b1120))
            .text_color(rgb(0xe2e8f0))
            .text_base()
            .tab_index(0)
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                this.handle_key(event, cx);
                cx.notify();
            }))
            .child(self.render_header())
            .child(
                div()
                    .flex()
                    .flex_1()
                    .gap_2()
                    .child(self.render_provider_panel(cx))
                    .child(center)
                    .child(self.render_knowledge_panel(cx)),
            )
            .child(
                div()
                    .p_2()
                    .text_sm()
                    .text_color(rgb(0x94a3b8))
                    .bg(rgb(0x111827))
                    .child(self.status.clone()),
            )
    }
}

fn apply_key(buffer: &mut String, key: &str, shift: bool) -> KeyOutcome {
    match key {
        "enter" => KeyOutcome::Submit,
        "backspace" => {
            if buffer.pop().is_some() {
                KeyOutcome::Changed
            } else {
                KeyOutcome::Unchanged
            }
        }
        "space" => {
            buffer.push(' ');
            KeyOutcome::Changed
        }
        key if key.chars().count() == 1 => {
            let ch = key.chars().next().unwrap_or_default();
            if shift {
                buffer.extend(ch.to_uppercase());
            } else {
                buffer.push(ch);
            }
            KeyOutcome::Changed
        }
        _ => KeyOutcome::Unchanged,
    }
}

fn accent_rgb(hex: &str) -> gpui::Rgba {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0x64748b);
    rgb(value)
}

fn flatten_markdown(markdown: &str) -> String {
    let mut output = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => output.push_str(&text),
            Event::SoftBreak | Event::HardBreak => output.push('\n'),
            _ => {}
        }
    }
    output
}

fn main() {
    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("helm");
    if let Err(error) = fs::create_dir_all(&data_dir) {
        eprintln!("failed to prepare data dir: {error}");
    }
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    let services = AppServicesBuilder::new(data_dir.join("helm.sqlite3"))
        .build()
        .expect("initialize app services");
    info!(data_dir = %data_dir.display(), "helm workspace ready");

    Application::new().run(move |cx: &mut App| {
        let bounds = Bounds::centered(None, size(px(1280.), px(860.)), cx);
        cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                titlebar: Some(gpui::TitlebarOptions {
                    title: Some("Helm".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            {
                let services = services.clone();
                move |_window, cx| cx.new(|_| HelmAppView::new(services))
            },
        )
        .expect("open main window");
        cx.activate(true);
    });
}

fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(error) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {error}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "helm.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,helm_app=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_key_edits_the_buffer() {
        let mut buffer = String::new();
        assert_eq!(apply_key(&mut buffer, "h", false), KeyOutcome::Changed);
        assert_eq!(apply_key(&mut buffer, "i", true), KeyOutcome::Changed);
        assert_eq!(apply_key(&mut buffer, "space", false), KeyOutcome::Changed);
        assert_eq!(apply_key(&mut buffer, "-", false), KeyOutcome::Changed);
        assert_eq!(buffer, "hI -");

        assert_eq!(apply_key(&mut buffer, "backspace", false), KeyOutcome::Changed);
        assert_eq!(buffer, "hI ");
        assert_eq!(apply_key(&mut buffer, "enter", false), KeyOutcome::Submit);
        assert_eq!(apply_key(&mut buffer, "f5", false), KeyOutcome::Unchanged);
        assert_eq!(buffer, "hI ");
    }

    #[test]
    fn backspace_on_empty_buffer_is_unchanged() {
        let mut buffer = String::new();
        assert_eq!(apply_key(&mut buffer, "backspace", false), KeyOutcome::Unchanged);
    }

    #[test]
    fn accent_rgb_falls_back_on_bad_input() {
        assert_eq!(
            format!("{:?}", accent_rgb("#10A37F")),
            format!("{:?}", rgb(0x10A37F))
        );
        assert_eq!(
            format!("{:?}", accent_rgb("not-a-color")),
            format!("{:?}", rgb(0x64748b))
        );
    }

    #[test]
    fn flatten_markdown_keeps_text_and_breaks() {
        let flattened = flatten_markdown("**bold** and `code`  \nnext line");
        assert!(flattened.contains("bold and code"));
        assert!(flattened.contains('\n'));
    }
}
