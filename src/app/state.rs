use eframe::egui;

use crate::logsink::{LogRecord, Severity};

use super::AppContext;

const SEVERITIES: [Severity; 4] =
    [Severity::Debug, Severity::Info, Severity::Warning, Severity::Error];

/// Data the egui window is created from.
#[derive(Debug, Clone)]
pub(crate) struct ShellState {
    pub(crate) context: AppContext,
    pub(crate) records: Vec<LogRecord>,
}

pub(crate) struct SmoreApp {
    context: AppContext,
    records: Vec<LogRecord>,
    min_severity: Severity,
}

impl SmoreApp {
    pub(crate) fn new(state: ShellState) -> Self {
        Self {
            context: state.context,
            records: state.records,
            min_severity: Severity::Info,
        }
    }

    fn ui_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Smore");
                ui.separator();
                ui.label(format!("Backend: {}", self.context.backend));
                ui.separator();
                ui.label(format!("Worker threads: {}", self.context.worker_threads));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    egui::ComboBox::from_id_salt("min_severity")
                        .selected_text(self.min_severity.as_str())
                        .show_ui(ui, |ui| {
                            for sev in SEVERITIES {
                                ui.selectable_value(&mut self.min_severity, sev, sev.as_str());
                            }
                        });
                    ui.label("Show:");
                });
            });
        });
    }

    fn ui_hardware(&self, ctx: &egui::Context) {
        egui::SidePanel::left("hardware")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Hardware");
                ui.add_space(8.0);

                if let Some(err) = &self.context.preload_error {
                    let color = ui.visuals().warn_fg_color;
                    ui.colored_label(color, "Hardware acceleration unavailable");
                    ui.small(err.as_str());
                    ui.add_space(8.0);
                }

                match &self.context.hardware {
                    Some(info) => {
                        egui::Grid::new("hardware_grid")
                            .num_columns(2)
                            .striped(true)
                            .show(ui, |ui| {
                                for (key, value) in info {
                                    ui.label(key.as_str());
                                    ui.label(value.as_str());
                                    ui.end_row();
                                }
                            });
                    }
                    None => {
                        ui.label("No hardware information.");
                    }
                }
            });
    }

    fn ui_log(&self, ui: &mut egui::Ui) {
        ui.heading("Startup log");
        ui.add_space(4.0);
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for record in self.records.iter().filter(|r| r.severity >= self.min_severity) {
                    let color = match record.severity {
                        Severity::Error => ui.visuals().error_fg_color,
                        Severity::Warning => ui.visuals().warn_fg_color,
                        Severity::Info | Severity::Debug => ui.visuals().text_color(),
                    };
                    ui.label(egui::RichText::new(record.to_string()).monospace().color(color));
                }
            });
    }
}

impl eframe::App for SmoreApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_header(ctx);
        self.ui_hardware(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.ui_log(ui));
    }
}
