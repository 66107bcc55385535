//! Orbit camera controls

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use showcase_core::{OrbitController, OrbitInput};

use crate::app::ShowcaseSettings;
use crate::scene::MainCamera;

/// Pixel scroll deltas per wheel line
const PIXELS_PER_LINE: f32 = 100.0;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_controls)
            .add_systems(Update, update_camera);
    }
}

#[derive(Resource)]
pub struct OrbitControls(pub OrbitController);

fn setup_controls(mut commands: Commands, settings: Res<ShowcaseSettings>) {
    let config = &settings.0;
    let eye = showcase_core::controls::Vec3::from_array(config.camera.position);
    commands.insert_resource(OrbitControls(OrbitController::new(
        config.controls.clone(),
        eye,
        showcase_core::controls::Vec3::ZERO,
    )));
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    controls: Option<ResMut<OrbitControls>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let Some(mut controls) = controls else { return };

    // Leave the pointer to egui while it is over a window
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let input = if egui_wants_pointer {
        OrbitInput::default()
    } else {
        gather_input(&mouse_motion, &mouse_scroll, &mouse_button, &touch_input)
    };

    controls.0.apply(&input);
    controls.0.advance(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        let focus = Vec3::from_array(controls.0.focus().to_array());
        transform.translation = Vec3::from_array(controls.0.eye().to_array());
        transform.look_at(focus, Vec3::Y);
    }
}

fn gather_input(
    mouse_motion: &AccumulatedMouseMotion,
    mouse_scroll: &AccumulatedMouseScroll,
    mouse_button: &ButtonInput<MouseButton>,
    touch_input: &Touches,
) -> OrbitInput {
    let mut input = OrbitInput::default();
    let motion = to_core(mouse_motion.delta);

    if mouse_button.pressed(MouseButton::Left) {
        input.rotate += motion;
    }
    if mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle) {
        input.pan += motion;
    }

    input.zoom = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_LINE,
    };

    let touches: Vec<_> = touch_input.iter().collect();
    match touches.as_slice() {
        // One finger orbits
        [touch] => input.rotate += to_core(touch.delta()),
        // Two fingers pinch to zoom
        [t1, t2] => {
            let curr_dist = t1.position().distance(t2.position());
            let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
            if curr_dist > 0.0 && prev_dist > 0.0 {
                input.pinch = prev_dist / curr_dist.max(1.0);
            }
        }
        _ => {}
    }

    input
}

fn to_core(v: Vec2) -> showcase_core::controls::Vec2 {
    showcase_core::controls::Vec2::from_array(v.to_array())
}
