//! UI overlays using bevy_egui, and the plain-text fallback page

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use showcase_core::{HostView, SuspenseFallback};

use crate::app::{ShowcaseHost, ShowcaseSettings};
use crate::models::{ModelSlot, ModelState};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Presents the fallback message instead of the 3D scene
pub struct FallbackPlugin;

impl Plugin for FallbackPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_fallback);
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    settings: Res<ShowcaseSettings>,
    slot: Option<Res<ModelSlot>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Some(slot) = slot else { return };

    match &slot.state {
        ModelState::Pending => {
            if let SuspenseFallback::Text(text) = &settings.0.model.fallback {
                egui::Area::new(egui::Id::new("model_placeholder"))
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .interactable(false)
                    .show(ctx, |ui| {
                        let placeholder = egui::RichText::new(text)
                            .size(18.0)
                            .color(egui::Color32::LIGHT_GRAY);
                        ui.label(placeholder);
                    });
            }
        }
        ModelState::Failed(message) => {
            // Error boundary: the scene stays up without the model
            egui::Window::new("Model failed to load")
                .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 16.0))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(&slot.path).monospace());
                    ui.colored_label(egui::Color32::from_rgb(230, 90, 90), message.as_str());
                });
        }
        ModelState::Ready => {}
    }
}

fn setup_fallback(mut commands: Commands, mut host: ResMut<ShowcaseHost>) {
    let HostView::Fallback(message) = host.shell.view() else { return };
    let message = message.to_string();
    tracing::info!("3D scene disabled, showing fallback");

    commands.spawn(Camera2d);
    commands.spawn((
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        children![(
            Text::new(message),
            TextFont {
                font_size: 24.0,
                ..default()
            },
            TextColor(Color::WHITE),
        )],
    ));
}
