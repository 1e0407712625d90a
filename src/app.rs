use eframe::egui::{self, Align, Color32, Layout, RichText, TextEdit, TextureHandle};
use log::info;
use std::collections::BTreeMap;

use crate::config::Settings;
use crate::document::InvoiceDocument;
use crate::error::AppError;
use crate::export::{Exporter, JobOutcome};
use crate::form::{InvoiceForm, coerce_decimal, coerce_quantity};
use crate::items::ItemUpdate;
use crate::logo::{self, Logo};
use crate::model::{CURRENCIES, ItemId, LineItem, PartyInfo, find_currency, format_money};
use crate::platform;
use crate::view::Action;

const ACCENT: Color32 = Color32::from_rgb(79, 70, 229);
const PANEL_FILL: Color32 = Color32::from_gray(248);

/// Raw text for the numeric cells of one row, so half-typed input like
/// "1." survives until it parses.
struct ItemDraft {
    quantity: String,
    rate: String,
}

impl ItemDraft {
    fn from_item(item: &LineItem) -> Self {
        ItemDraft {
            quantity: item.quantity.to_string(),
            rate: item.rate.to_string(),
        }
    }
}

pub struct InvoiceApp {
    form: InvoiceForm,
    settings: Settings,
    exporter: Exporter,
    drafts: BTreeMap<ItemId, ItemDraft>,
    tax_text: String,
    issue_text: String,
    due_text: String,
    /// Decoded logo, keyed by the logo it came from. `None` texture means it failed to decode.
    logo_texture: Option<(Logo, Option<TextureHandle>)>,
    status: Option<String>,
}

impl InvoiceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        let form = InvoiceForm::new(&settings);
        InvoiceApp {
            tax_text: form.meta.tax_percent.to_string(),
            issue_text: form.meta.issue_date.format("%Y-%m-%d").to_string(),
            due_text: form.meta.due_date.format("%Y-%m-%d").to_string(),
            form,
            settings,
            exporter: Exporter::new(),
            drafts: BTreeMap::new(),
            logo_texture: None,
            status: None,
        }
    }

    fn request(&mut self, ctx: &egui::Context, action: Action) {
        if self.exporter.is_busy() {
            self.status = Some(AppError::ExportBusy.to_string());
            return;
        }
        if let Some(ready) = self.form.request(action) {
            self.dispatch(ctx, ready);
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, action: Action) {
        let doc = InvoiceDocument::from_form(&self.form);
        let repaint = ctx.clone();
        match self
            .exporter
            .start(action, doc, self.settings.output_path(), move || repaint.request_repaint())
        {
            Ok(()) => {
                self.status = Some(match action {
                    Action::Export => "Generating PDF...".to_string(),
                    Action::Print => "Preparing print...".to_string(),
                })
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn drain_jobs(&mut self) {
        while let Some(outcome) = self.exporter.poll() {
            match outcome {
                JobOutcome::Exported(path) => {
                    self.status = Some(format!("Saved {}", path.display()));
                    platform::reveal(&path);
                }
                JobOutcome::Printed(path) => {
                    self.status = Some(format!("Opened {} for printing", path.display()));
                }
                JobOutcome::Failed {
                    action: Action::Export,
                    message,
                } => {
                    self.status = Some(format!("PDF export failed: {}", message));
                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Error)
                        .set_title("Export failed")
                        .set_description("There was an error generating the PDF. Please try again.")
                        .set_buttons(rfd::MessageButtons::Ok)
                        .show();
                }
                JobOutcome::Failed {
                    action: Action::Print,
                    message,
                } => {
                    self.status = Some(format!("Print failed: {}", message));
                }
            }
        }
    }

    fn logo_texture(&mut self, ctx: &egui::Context) -> Option<TextureHandle> {
        let Some(logo) = self.form.meta.logo.as_ref() else {
            self.logo_texture = None;
            return None;
        };
        let stale = match &self.logo_texture {
            Some((cached, _)) => !cached.same_source(logo),
            None => true,
        };
        if stale {
            let texture = match logo.decode() {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    Some(ctx.load_texture("invoice-logo", image, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    log::warn!("Cannot show logo {}: {}", logo.file_name, e);
                    None
                }
            };
            self.logo_texture = Some((logo.clone(), texture));
        }
        self.logo_texture.as_ref().and_then(|(_, t)| t.clone())
    }

    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("Invoice Generator").color(Color32::WHITE).strong());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let busy = self.exporter.is_busy();
                if ui.add_enabled(!busy, egui::Button::new("Download PDF")).clicked() {
                    self.request(ctx, Action::Export);
                }
                if ui.add_enabled(!busy, egui::Button::new("Print")).clicked() {
                    self.request(ctx, Action::Print);
                }
                let label = if self.form.view().is_preview() { "Edit" } else { "Preview" };
                if ui.button(label).clicked() {
                    self.form.toggle_preview();
                }
            });
        });
    }

    fn sync_drafts(&mut self) {
        let ids = self.form.items().ids();
        self.drafts.retain(|id, _| ids.contains(id));
        for item in self.form.items().iter() {
            self.drafts
                .entry(item.id)
                .or_insert_with(|| ItemDraft::from_item(item));
        }
    }

    fn edit_view(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal_top(|ui| {
            egui::Grid::new("invoice_meta")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Invoice Number");
                    ui.text_edit_singleline(&mut self.form.meta.number);
                    ui.end_row();

                    ui.label("Date");
                    if ui.text_edit_singleline(&mut self.issue_text).changed() {
                        self.form.set_issue_date_text(&self.issue_text);
                    }
                    ui.end_row();

                    ui.label("Due Date");
                    if ui.text_edit_singleline(&mut self.due_text).changed() {
                        self.form.set_due_date_text(&self.due_text);
                    }
                    ui.end_row();

                    ui.label("Currency");
                    let selected = find_currency(&self.form.meta.currency)
                        .map(|c| c.label())
                        .unwrap_or_else(|| self.form.meta.currency.clone());
                    egui::ComboBox::from_id_salt("currency")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for currency in CURRENCIES {
                                ui.selectable_value(
                                    &mut self.form.meta.currency,
                                    currency.symbol.to_string(),
                                    currency.label(),
                                );
                            }
                        });
                    ui.end_row();

                    ui.label("Tax (%)");
                    if ui.text_edit_singleline(&mut self.tax_text).changed() {
                        self.form.set_tax_text(&self.tax_text);
                    }
                    ui.end_row();
                });

            ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
                ui.vertical(|ui| {
                    if let Some(texture) = self.logo_texture(ctx) {
                        ui.add(
                            egui::Image::from_texture(egui::load::SizedTexture::from_handle(&texture))
                                .max_size(egui::vec2(120.0, 60.0)),
                        );
                    }
                    let label = if self.form.meta.logo.is_some() { "Change Logo" } else { "Upload Logo" };
                    if ui.button(label).clicked() {
                        if let Some(logo) = logo::pick_logo() {
                            self.form.set_logo(logo);
                        }
                    }
                    if self.form.meta.logo.is_some() && ui.button("Remove Logo").clicked() {
                        self.form.clear_logo();
                    }
                });
            });
        });

        ui.add_space(12.0);
        ui.columns(2, |cols| {
            party_editor(&mut cols[0], "Your Business Details", "business", &mut self.form.issuer);
            party_editor(&mut cols[1], "Client Details", "client", &mut self.form.recipient);
        });

        ui.add_space(12.0);
        ui.label(RichText::new(format!("Invoice Items ({})", self.form.items().len())).strong());
        self.items_editor(ui);

        ui.add_space(8.0);
        self.totals_block(ui, &self.form.meta.currency.clone());

        ui.add_space(12.0);
        ui.label(RichText::new("Notes").strong());
        ui.add(
            TextEdit::multiline(&mut self.form.notes)
                .hint_text("Add any notes or payment instructions...")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
    }

    fn items_editor(&mut self, ui: &mut egui::Ui) {
        self.sync_drafts();
        let currency = self.form.meta.currency.clone();
        let mut removed = None;

        egui::Grid::new("invoice_items")
            .num_columns(5)
            .striped(true)
            .spacing([10.0, 6.0])
            .show(ui, |ui| {
                for heading in ["Description", "Quantity", "Rate", "Amount", ""] {
                    ui.label(RichText::new(heading).small().strong());
                }
                ui.end_row();

                for id in self.form.items().ids() {
                    let Some(item) = self.form.items().get(id).cloned() else {
                        continue;
                    };
                    let Some(draft) = self.drafts.get_mut(&id) else {
                        continue;
                    };

                    let mut description = item.description.clone();
                    if ui
                        .add(
                            TextEdit::singleline(&mut description)
                                .hint_text("Item description")
                                .desired_width(260.0),
                        )
                        .changed()
                    {
                        self.form.update_item(id, ItemUpdate::Description(description));
                    }
                    if ui
                        .add(TextEdit::singleline(&mut draft.quantity).desired_width(60.0))
                        .changed()
                    {
                        self.form
                            .update_item(id, ItemUpdate::Quantity(coerce_quantity(&draft.quantity)));
                    }
                    ui.horizontal(|ui| {
                        ui.label(currency.as_str());
                        if ui
                            .add(TextEdit::singleline(&mut draft.rate).desired_width(80.0))
                            .changed()
                        {
                            self.form
                                .update_item(id, ItemUpdate::Rate(coerce_decimal(&draft.rate)));
                        }
                    });
                    let amount = self.form.items().get(id).map_or(0.0, |i| i.amount);
                    ui.label(format_money(&currency, amount));
                    if ui.button("Remove").clicked() {
                        removed = Some(id);
                    }
                    ui.end_row();
                }
            });

        if let Some(id) = removed {
            self.form.remove_item(id);
        }
        if ui.button("+ Add Item").clicked() {
            self.form.add_item();
        }
    }

    fn totals_block(&self, ui: &mut egui::Ui, currency: &str) {
        let totals = self.form.totals();
        ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
            egui::Grid::new("invoice_totals")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Subtotal:");
                    ui.label(format_money(currency, totals.subtotal));
                    ui.end_row();
                    ui.label(format!("Tax ({}%):", self.form.meta.tax_percent));
                    ui.label(format_money(currency, totals.tax_amount));
                    ui.end_row();
                    ui.label(RichText::new("Total:").strong());
                    ui.label(RichText::new(format_money(currency, totals.total)).strong());
                    ui.end_row();
                });
        });
    }

    fn preview_view(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let doc = InvoiceDocument::from_form(&self.form);
        let texture = self.logo_texture(ctx);

        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                ui.label(RichText::new("INVOICE").size(24.0).strong());
                ui.label(format!("Invoice Number: {}", doc.number));
                ui.label(format!("Date: {}", doc.issue_date));
                ui.label(format!("Due Date: {}", doc.due_date));
            });
            if let Some(texture) = texture {
                ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(&texture))
                            .max_size(egui::vec2(120.0, 60.0)),
                    );
                });
            }
        });

        ui.add_space(12.0);
        ui.columns(2, |cols| {
            party_card(&mut cols[0], "From:", &doc.from);
            party_card(&mut cols[1], "Bill To:", &doc.bill_to);
        });

        ui.add_space(12.0);
        ui.label(RichText::new("Items").strong());
        if self.form.items().is_empty() {
            ui.label(RichText::new("No items").italics());
        }
        egui::Grid::new("preview_items")
            .num_columns(4)
            .striped(true)
            .min_col_width(80.0)
            .show(ui, |ui| {
                for heading in ["DESCRIPTION", "QTY", "RATE", "AMOUNT"] {
                    ui.label(RichText::new(heading).small().strong());
                }
                ui.end_row();
                for row in &doc.rows {
                    ui.label(row.description.as_str());
                    ui.label(row.quantity.as_str());
                    ui.label(row.rate.as_str());
                    ui.label(row.amount.as_str());
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
            egui::Grid::new("preview_totals")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Subtotal:");
                    ui.label(doc.subtotal.as_str());
                    ui.end_row();
                    ui.label(format!("{}:", doc.tax_label));
                    ui.label(doc.tax_amount.as_str());
                    ui.end_row();
                    ui.label(RichText::new("Total:").strong());
                    ui.label(RichText::new(&doc.total).strong());
                    ui.end_row();
                });
        });

        if let Some(notes) = &doc.notes {
            ui.add_space(12.0);
            ui.label(RichText::new("Notes").strong());
            ui.label(RichText::new(notes).small());
        }
    }
}

fn party_editor(ui: &mut egui::Ui, title: &str, id: &str, party: &mut PartyInfo) {
    ui.label(RichText::new(title).strong());
    egui::Grid::new(id).num_columns(2).spacing([8.0, 4.0]).show(ui, |ui| {
        ui.label("Name");
        ui.text_edit_singleline(&mut party.name);
        ui.end_row();
        ui.label("Email");
        ui.text_edit_singleline(&mut party.email);
        ui.end_row();
        ui.label("Phone");
        ui.text_edit_singleline(&mut party.phone);
        ui.end_row();
        ui.label("Address");
        ui.add(TextEdit::multiline(&mut party.address).desired_rows(2));
        ui.end_row();
    });
}

fn party_card(ui: &mut egui::Ui, heading: &str, party: &PartyInfo) {
    egui::Frame::group(ui.style()).fill(PANEL_FILL).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(heading).strong());
        ui.label(RichText::new(&party.name).strong());
        ui.label(party.email.as_str());
        ui.label(party.phone.as_str());
        ui.label(party.address.as_str());
    });
}

impl eframe::App for InvoiceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_jobs();

        egui::TopBottomPanel::top("toolbar")
            .frame(egui::Frame::side_top_panel(&ctx.style()).fill(ACCENT))
            .show(ctx, |ui| {
                ui.add_space(6.0);
                self.toolbar(ctx, ui);
                ui.add_space(6.0);
            });

        if let Some(status) = &self.status {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.label(RichText::new(status).small());
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if self.form.view().is_preview() {
                    self.preview_view(ctx, ui);
                } else {
                    self.edit_view(ctx, ui);
                }
            });
        });

        // The frame for the current mode is laid out; release any parked action.
        if let Some(action) = self.form.render_committed() {
            info!("Preview rendered, running {:?}", action);
            self.dispatch(ctx, action);
        } else if self.form.view().parked().is_some() {
            ctx.request_repaint();
        }
    }
}
