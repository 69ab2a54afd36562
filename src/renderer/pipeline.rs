use gfx_hal::{format as f, pass::Subpass, prelude::*, pso, Backend};
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ops::Range;
use std::ptr;

use super::vertex::{Color, Position};
use crate::error::{Error, Result};

const ENTRY_NAME: &str = "main";

pub const POSITION_BINDING: pso::BufferIndex = 0;
pub const COLOR_BINDING: pso::BufferIndex = 1;

/// The linked vertex + fragment program.
pub struct Pipeline<'a, B: Backend> {
    device: &'a B::Device,
    pub pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pub pipeline_layout: ManuallyDrop<B::PipelineLayout>,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    pub fn new(
        device: &'a B::Device,
        vs_spirv: &[u32],
        fs_spirv: &[u32],
        render_pass: &B::RenderPass,
    ) -> Result<Self> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                iter::empty::<B::DescriptorSetLayout>(),
                iter::empty::<(pso::ShaderStageFlags, Range<u32>)>(),
            )
        }
        .map_err(Error::gpu("create pipeline layout"))?;

        match Self::link(device, vs_spirv, fs_spirv, render_pass, &pipeline_layout) {
            Ok(pipeline) => Ok(Pipeline {
                device,
                pipeline: ManuallyDrop::new(pipeline),
                pipeline_layout: ManuallyDrop::new(pipeline_layout),
            }),
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(err)
            }
        }
    }

    fn link(
        device: &B::Device,
        vs_spirv: &[u32],
        fs_spirv: &[u32],
        render_pass: &B::RenderPass,
        pipeline_layout: &B::PipelineLayout,
    ) -> Result<B::GraphicsPipeline> {
        let vs_module = unsafe { device.create_shader_module(vs_spirv) }
            .map_err(|err| Error::Link(format!("vertex module: {:?}", err)))?;
        let fs_module = match unsafe { device.create_shader_module(fs_spirv) } {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_shader_module(vs_module) };
                return Err(Error::Link(format!("fragment module: {:?}", err)));
            }
        };

        let pipeline = {
            let shader_entries = pso::GraphicsShaderSet {
                vertex: pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &vs_module,
                    specialization: pso::Specialization::default(),
                },
                hull: None,
                domain: None,
                geometry: None,
                fragment: Some(pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &fs_module,
                    specialization: pso::Specialization::default(),
                }),
            };

            let subpass = Subpass {
                index: 0,
                main_pass: render_pass,
            };

            let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
                shader_entries,
                pso::Primitive::TriangleList,
                pso::Rasterizer::FILL,
                pipeline_layout,
                subpass,
            );
            pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
                mask: pso::ColorMask::ALL,
                blend: Some(pso::BlendState::ALPHA),
            });

            // position and color live in separate buffers
            pipeline_desc.vertex_buffers.push(pso::VertexBufferDesc {
                binding: POSITION_BINDING,
                stride: mem::size_of::<Position>() as u32,
                rate: pso::VertexInputRate::Vertex,
            });
            pipeline_desc.vertex_buffers.push(pso::VertexBufferDesc {
                binding: COLOR_BINDING,
                stride: mem::size_of::<Color>() as u32,
                rate: pso::VertexInputRate::Vertex,
            });

            pipeline_desc.attributes.push(pso::AttributeDesc {
                location: 0,
                binding: POSITION_BINDING,
                element: pso::Element {
                    format: f::Format::Rg32Sfloat,
                    offset: 0,
                },
            });
            pipeline_desc.attributes.push(pso::AttributeDesc {
                location: 1,
                binding: COLOR_BINDING,
                element: pso::Element {
                    format: f::Format::Rgba32Sfloat,
                    offset: 0,
                },
            });

            unsafe { device.create_graphics_pipeline(&pipeline_desc, None) }
        };

        // modules are not needed once the pipeline exists
        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        let pipeline = pipeline.map_err(|err| Error::Link(format!("{:?}", err)))?;
        log::info!("shader program linked");
        Ok(pipeline)
    }
}

impl<'a, B: Backend> Drop for Pipeline<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(&self.pipeline)));
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
    }
}
