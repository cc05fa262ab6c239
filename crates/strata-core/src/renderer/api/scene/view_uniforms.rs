// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-draw view uniforms.

use glam::{Mat4, Vec3};

/// Transform data for one draw, formatted for GPU consumption.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    /// The model-to-world transformation matrix.
    pub model_matrix: [[f32; 4]; 4],
    /// The transposed inverse of the model matrix for correct normal transformation.
    pub normal_matrix: [[f32; 4]; 4],
    /// `view * model`.
    pub modelview_matrix: [[f32; 4]; 4],
    /// `projection * view * model`.
    pub modelview_projection_matrix: [[f32; 4]; 4],
    /// World-space camera position (xyz), w is 1.
    pub camera_position: [f32; 4],
}

impl ViewUniforms {
    /// Computes the uniforms of a draw from its model transform and the
    /// eye's view and projection.
    pub fn new(model: &Mat4, view: &Mat4, projection: &Mat4, camera_position: Vec3) -> Self {
        let modelview = *view * *model;
        let mvp = *projection * modelview;
        let normal = model.inverse().transpose();
        Self {
            model_matrix: model.to_cols_array_2d(),
            normal_matrix: normal.to_cols_array_2d(),
            modelview_matrix: modelview.to_cols_array_2d(),
            modelview_projection_matrix: mvp.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn modelview_projection_is_projection_view_model() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);

        let uniforms = ViewUniforms::new(&model, &view, &projection, Vec3::new(0.0, 0.0, 5.0));

        let expected = projection * view * model;
        let actual = Mat4::from_cols_array_2d(&uniforms.modelview_projection_matrix);
        for (a, e) in actual.to_cols_array().iter().zip(expected.to_cols_array()) {
            assert_relative_eq!(*a, e, epsilon = 1e-5);
        }
        assert_eq!(uniforms.camera_position, [0.0, 0.0, 5.0, 1.0]);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniforms = ViewUniforms::new(&model, &Mat4::IDENTITY, &Mat4::IDENTITY, Vec3::ZERO);
        let normal = Mat4::from_cols_array_2d(&uniforms.normal_matrix);
        assert_relative_eq!(normal.x_axis.x, 0.5);
        assert_relative_eq!(normal.y_axis.y, 1.0);
    }
}
