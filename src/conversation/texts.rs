//! User-facing strings.

pub const BUTTON_CHECK_IN: &str = "Отметить вход";
pub const BUTTON_SELL: &str = "Продать билет";
pub const BUTTON_CANCEL: &str = "Отмена";
pub const BUTTON_BASE: &str = "Базовый";
pub const BUTTON_VIP: &str = "ВИП";
pub const BUTTON_YES: &str = "Да";
pub const BUTTON_NO: &str = "Нет";

pub const ACCESS_DENIED: &str = "У Вас нет прав на использование бота.";
pub const CHECK_IN_DENIED: &str = "У Вас нет прав для отметки входа.";
pub const SELL_DENIED: &str = "У Вас нет прав для продажи билетов.";
pub const VIP_DENIED: &str = "У Вас нет прав для продажи ВИП-билетов. Выберите другой тип:";

pub const MENU: &str = "Выберите опцию:";
pub const MENU_HINT: &str = "Не понимаю. Выберите опцию в меню:";
pub const CANCELLED: &str = "Операция отменена.";

pub const PROMPT_SEARCH: &str = "Введите фамилию или номер билета для поиска:";
pub const PROMPT_FIO: &str = "Введите ФИО покупателя:";
pub const PROMPT_TICKET_TYPE: &str = "Выберите тип билета (БАЗОВЫЙ или ВИП):";
pub const PROMPT_PRICE: &str = "Введите стоимость билета:";
pub const PROMPT_REPOST: &str = "Укажите наличие репоста (да/нет):";
pub const PROCESSING: &str = "Операция обрабатывается...";

pub const SEARCH_EMPTY: &str = "Поисковый запрос не может быть пустым. Введите фамилию или номер билета:";
pub const FIO_EMPTY: &str = "ФИО не может быть пустым. Введите ещё раз:";
pub const FIO_INVALID: &str = "Проверьте введенное ФИО (нужны как минимум фамилия и имя):";
pub const TICKET_TYPE_INVALID: &str = "Неверный тип билета. Попробуйте ещё раз:";
pub const VIP_UNAVAILABLE: &str = "ВИП-билеты сейчас не продаются. Выберите другой тип:";
pub const PRICE_INVALID: &str = "Проверьте введенную цену. Попробуйте ещё раз:";
pub const REPOST_INVALID: &str = "Ответьте «да» или «нет». Укажите наличие репоста:";
pub const DRAFT_LOST: &str = "Данные продажи потеряны, начните заново.";

pub const NOT_FOUND: &str = "Покупатель не найден.";
pub const SEARCH_FAILED: &str = "Не удалось выполнить поиск. Попробуйте позже.";
pub const FOUND_HEADER: &str = "Найдены следующие покупатели:";
pub const PICK_TICKET: &str = "Выберите нужного покупателя, чтобы отметить вход:";
pub const LIST_CLOSED: &str = "Список закрыт.";
pub const ALL_PASSED: &str = "Все найденные покупатели уже прошли контроль.";

pub const ENTRY_MARKED: &str = "Вход отмечен.";
pub const ALREADY_ENTERED: &str = "Этот билет уже прошёл контроль!";
pub const ENTRY_FAILED: &str = "Не удалось отметить вход. Попробуйте ещё раз.";

pub const DUPLICATE_SALE: &str = "На этого покупателя уже продан билет. Продажа отменена.";
pub const SALE_FAILED: &str = "Не удалось сохранить продажу. Попробуйте ещё раз.";
pub const SHEET_FAILED: &str = "Не удалось записать продажу в таблицу, внесите её вручную.";
pub const IMAGE_FAILED: &str = "Не удалось отправить изображение билета.";

pub fn prompt_vip_table(tables: u8) -> String {
    format!("Введите номер ВИП-стола (1–{}):", tables)
}

pub fn sale_confirmed(ticket_number: i64, full_name: &str, ticket_type: &str, price: u32) -> String {
    format!(
        "Билет №{} продан.\nФИО: {}\nТип: {}\nЦена: {}",
        ticket_number, full_name, ticket_type, price
    )
}

pub fn help(checker: bool, seller: bool) -> String {
    let mut text = String::from("Команды:\n/start — главное меню\n");
    if checker {
        text.push_str("/checkin — отметить вход\n");
    }
    if seller {
        text.push_str("/sell — продать билет\n");
    }
    text.push_str("/cancel — отменить текущую операцию");
    text
}
