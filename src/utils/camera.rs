use glam::{Mat4, Quat, Vec2, Vec3};

#[derive(Debug, Copy, Clone, Default)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fast: bool,
    pub mouse_delta: Vec2,
}

/// First person camera flying over the terrain.
#[derive(Debug, Copy, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub fast_speed: f32,
    pub sensitivity: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub input: CameraInput,
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            speed: 50.0,
            fast_speed: 400.0,
            sensitivity: 0.003,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 20_000.0,
            input: CameraInput::default(),
        }
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let mut forward = target - self.position;
        if forward.length_squared() == 0.0 {
            forward = Vec3::NEG_Z;
        }
        let forward = forward.normalize();
        self.pitch = forward.y.clamp(-1.0, 1.0).asin();
        self.yaw = (-forward.x).atan2(-forward.z);
    }

    pub fn forward(&self) -> Vec3 {
        Self::rotation(self.yaw, self.pitch) * Vec3::NEG_Z
    }

    /// Apply this frame's input and move the camera.
    pub fn update(&mut self, dt: f32) {
        let mouse_delta = std::mem::take(&mut self.input.mouse_delta);
        self.yaw += mouse_delta.x * self.sensitivity;
        self.pitch = (self.pitch + mouse_delta.y * self.sensitivity).clamp(-1.54, 1.54);

        let rotation = Self::rotation(self.yaw, self.pitch);
        let forward = rotation * Vec3::NEG_Z;
        let right = rotation * Vec3::X;

        let mut direction = Vec3::ZERO;
        let axes = [
            (self.input.forward, forward),
            (self.input.back, -forward),
            (self.input.right, right),
            (self.input.left, -right),
            (self.input.up, Vec3::Y),
            (self.input.down, Vec3::NEG_Y),
        ];
        for (pressed, axis) in axes {
            if pressed {
                direction += axis;
            }
        }
        if direction.length_squared() > 0.0 {
            let speed = if self.input.fast {
                self.fast_speed
            } else {
                self.speed
            };
            self.position += direction.normalize() * speed * dt;
        }
    }

    pub fn view(&self) -> Mat4 {
        let rotation = Self::rotation(self.yaw, self.pitch);
        Mat4::from_rotation_translation(rotation, self.position).inverse()
    }

    pub fn view_proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far) * self.view()
    }

    fn rotation(yaw: f32, pitch: f32) -> Quat {
        Quat::from_axis_angle(Vec3::Y, yaw) * Quat::from_axis_angle(Vec3::X, pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_input_moves_along_view() {
        let mut camera = FlyCamera::new(Vec3::ZERO);
        camera.input.forward = true;
        camera.update(1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, -50.0)).length() < 1e-4);
    }

    #[test]
    fn up_is_world_up_regardless_of_pitch() {
        let mut camera = FlyCamera::new(Vec3::ZERO);
        camera.pitch = -1.0;
        camera.input.up = true;
        camera.input.fast = true;
        camera.update(0.5);
        assert!((camera.position - Vec3::new(0.0, 200.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = FlyCamera::new(Vec3::ZERO);
        camera.input.mouse_delta = Vec2::new(0.0, 10_000.0);
        camera.update(0.0);
        assert_eq!(camera.pitch, 1.54);
        assert_eq!(camera.input.mouse_delta, Vec2::ZERO);
    }

    #[test]
    fn look_at_faces_target() {
        let mut camera = FlyCamera::new(Vec3::new(0.0, 10.0, 0.0));
        camera.set_look_at(Vec3::new(10.0, 10.0, 0.0));
        assert!((camera.forward() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn view_moves_camera_to_origin() {
        let camera = FlyCamera::new(Vec3::new(3.0, 4.0, 5.0));
        let p = camera.view().transform_point3(camera.position);
        assert!(p.length() < 1e-4);
    }
}
